//! Scenario presets bundled into the binary.

use anyhow::anyhow;

use crate::config::{parse_config, JobConfig};

/// A named scenario shipped with the CLI.
pub struct Preset {
    pub name: &'static str,
    pub description: &'static str,
    pub source: &'static str,
}

pub const PRESETS: &[Preset] = &[
    Preset {
        name: "broadside_block",
        description: "5 GHz line source onto a PEC wall with two openings",
        source: include_str!("../../../scenarios/broadside_block.toml"),
    },
    Preset {
        name: "tfsf_pulse",
        description: "TF/SF Gaussian pulse absorbed by a split-field PML",
        source: include_str!("../../../scenarios/tfsf_pulse.toml"),
    },
    Preset {
        name: "double_slit",
        description: "2 GHz wave through a dual-slit screen, accumulated intensity",
        source: include_str!("../../../scenarios/double_slit.toml"),
    },
    Preset {
        name: "lloyds_mirror",
        description: "8 degree beam interfering with its reflection off a PEC row",
        source: include_str!("../../../scenarios/lloyds_mirror.toml"),
    },
];

pub fn find(name: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.name == name)
}

/// Parse the preset called `name`.
pub fn load(name: &str) -> anyhow::Result<JobConfig> {
    let preset = find(name).ok_or_else(|| {
        let known: Vec<&str> = PRESETS.iter().map(|p| p.name).collect();
        anyhow!("unknown preset '{}' (available: {})", name, known.join(", "))
    })?;
    parse_config(preset.source)
}
