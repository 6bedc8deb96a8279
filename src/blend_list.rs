use crate::registry;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// How a key moves between two snapshots during a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendKind {
    /// Linear interpolation of the numeric values.
    Continuous,
    /// Holds `from` until the halfway point, then jumps to `to`.
    Step,
}

impl BlendKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "continuous" | "lerp" => Some(Self::Continuous),
            "step" => Some(Self::Step),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Continuous => "continuous",
            Self::Step => "step",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlendEntry {
    pub key: String,
    pub kind: BlendKind,
    /// Remote address that mirrors every blended value, if any.
    pub echo: Option<String>,
}

impl BlendEntry {
    pub fn continuous(key: &str) -> Self {
        Self {
            key: key.to_string(),
            kind: BlendKind::Continuous,
            echo: None,
        }
    }

    pub fn with_echo(mut self, address: &str) -> Self {
        self.echo = Some(address.to_string());
        self
    }
}

/// The keys a transition animates; everything else only changes at commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlendList {
    entries: Vec<BlendEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlendListError {
    Io(String),
    Parse { line: usize, message: String },
    Empty,
    DuplicateKey(String),
}

impl fmt::Display for BlendListError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
            Self::Parse { line, message } => write!(f, "parse error at line {line}: {message}"),
            Self::Empty => write!(f, "blend list must contain at least one entry"),
            Self::DuplicateKey(key) => write!(f, "duplicate blend key: {key}"),
        }
    }
}

impl std::error::Error for BlendListError {}

impl Default for BlendList {
    fn default() -> Self {
        Self::builtin()
    }
}

impl BlendList {
    pub fn new(entries: Vec<BlendEntry>) -> Result<Self, BlendListError> {
        let list = Self { entries };
        list.validate()?;
        Ok(list)
    }

    /// The sixteen look parameters the installation animates between presets.
    pub fn builtin() -> Self {
        use registry::*;
        Self {
            entries: vec![
                BlendEntry::continuous(OPTICAL_FLOW_STRENGTH).with_echo("/1/strength"),
                BlendEntry::continuous(VELOCITY_MASK_HUE_OFFSET),
                BlendEntry::continuous(OPTICAL_FLOW_THRESHOLD),
                BlendEntry::continuous(RECOLOR_CUTOFF).with_echo("/1/cutoff"),
                BlendEntry::continuous(FLUID_SPEED).with_echo("/1/speed"),
                BlendEntry::continuous(FLUID_CELL_SIZE),
                BlendEntry::continuous(FLUID_VISCOSITY),
                BlendEntry::continuous(FLUID_VORTICITY),
                BlendEntry::continuous(FLUID_DISSIPATION),
                BlendEntry::continuous(VELOCITY_MASK_STRENGTH),
                BlendEntry::continuous(PARTICLE_SPAWN_HUE).with_echo("/1/spawn_hue"),
                BlendEntry::continuous(PARTICLE_SIZE).with_echo("/1/particle_size"),
                BlendEntry::continuous(PARTICLE_MASS),
                BlendEntry::continuous(PARTICLE_MASS_SPREAD),
                BlendEntry::continuous(PARTICLE_LIFESPAN),
                BlendEntry::continuous(PARTICLE_CELL_SIZE),
            ],
        }
    }

    pub fn parse(text: &str) -> Result<Self, BlendListError> {
        let mut entries = Vec::new();

        for (line_idx, raw) in text.lines().enumerate() {
            let line_no = line_idx + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let tokens: Vec<&str> = trimmed.split_whitespace().collect();
            if tokens.first().copied() != Some("blend") {
                return Err(BlendListError::Parse {
                    line: line_no,
                    message: "expected 'blend'".to_string(),
                });
            }
            if !(3..=4).contains(&tokens.len()) {
                return Err(BlendListError::Parse {
                    line: line_no,
                    message: "blend expects: blend <key> <continuous|step> [echo-address]"
                        .to_string(),
                });
            }

            let kind = BlendKind::parse(tokens[2]).ok_or_else(|| BlendListError::Parse {
                line: line_no,
                message: format!("unknown blend kind '{}'", tokens[2]),
            })?;
            let echo = match tokens.get(3) {
                Some(addr) if addr.starts_with('/') => Some(addr.to_string()),
                Some(addr) => {
                    return Err(BlendListError::Parse {
                        line: line_no,
                        message: format!("echo address must start with '/': '{addr}'"),
                    });
                }
                None => None,
            };

            entries.push(BlendEntry {
                key: tokens[1].to_string(),
                kind,
                echo,
            });
        }

        Self::new(entries)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, BlendListError> {
        let text =
            std::fs::read_to_string(path.as_ref()).map_err(|e| BlendListError::Io(e.to_string()))?;
        Self::parse(&text)
    }

    pub fn to_text(&self) -> String {
        self.entries
            .iter()
            .map(|entry| match &entry.echo {
                Some(echo) => format!("blend {} {} {}", entry.key, entry.kind.as_str(), echo),
                None => format!("blend {} {}", entry.key, entry.kind.as_str()),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn entries(&self) -> &[BlendEntry] {
        &self.entries
    }

    pub fn get(&self, key: &str) -> Option<&BlendEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    pub fn validate(&self) -> Result<(), BlendListError> {
        if self.entries.is_empty() {
            return Err(BlendListError::Empty);
        }
        let mut seen = HashSet::new();
        for entry in &self.entries {
            if !seen.insert(entry.key.as_str()) {
                return Err(BlendListError::DuplicateKey(entry.key.clone()));
            }
        }
        Ok(())
    }
}
