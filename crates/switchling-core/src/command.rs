// ── Batch request builders ──
//
// All mutating operations flow through a unified `BatchRequest` enum.
// Each variant renders to one `CommandBatch` that ends in `write memory`,
// so every mutation is persisted on the device and uniformly loggable.

use std::fmt;

use crate::error::CoreError;
use crate::model::CommandBatch;

/// Switchport operating mode for VLAN assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchportMode {
    Access,
    Trunk,
}

impl SwitchportMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Trunk => "trunk",
        }
    }
}

/// Action taken when port security trips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationMode {
    Protect,
    Restrict,
    Shutdown,
}

impl ViolationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Protect => "protect",
            Self::Restrict => "restrict",
            Self::Shutdown => "shutdown",
        }
    }
}

/// Port-security MAC aging behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgingMode {
    Absolute,
    Inactivity,
}

impl AgingMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Absolute => "absolute",
            Self::Inactivity => "inactivity",
        }
    }
}

/// One port-security knob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortSecurityPolicy {
    /// Maximum number of secure MAC addresses.
    Maximum(u32),
    Violation(ViolationMode),
    /// Statically secure one MAC address.
    MacAddress(String),
    /// Aging time in minutes.
    AgingTime(u32),
    AgingType(AgingMode),
}

impl PortSecurityPolicy {
    fn render(&self) -> String {
        match self {
            Self::Maximum(n) => format!("switchport port-security maximum {n}"),
            Self::Violation(mode) => {
                format!("switchport port-security violation {}", mode.as_str())
            }
            Self::MacAddress(mac) => format!("switchport port-security mac-address {mac}"),
            Self::AgingTime(minutes) => {
                format!("switchport port-security aging time {minutes}")
            }
            Self::AgingType(mode) => {
                format!("switchport port-security aging type {}", mode.as_str())
            }
        }
    }
}

/// Interface speed setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortSpeed {
    Ten,
    Hundred,
    Thousand,
    Auto,
}

impl fmt::Display for PortSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ten => "10",
            Self::Hundred => "100",
            Self::Thousand => "1000",
            Self::Auto => "auto",
        })
    }
}

/// Interface duplex setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplexMode {
    Auto,
    Full,
    Half,
}

impl DuplexMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Full => "full",
            Self::Half => "half",
        }
    }
}

/// All mutating operations expressible against a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchRequest {
    CreateVlan {
        number: u16,
        name: String,
    },
    AssignVlan {
        interface: String,
        mode: SwitchportMode,
        vlan: u16,
    },
    AssignNativeVlan {
        interface: String,
        vlan: u16,
    },
    PortSecurity {
        interface: String,
        policy: PortSecurityPolicy,
    },
    /// At least one of `speed` / `duplex` must be set.
    SpeedDuplex {
        interface: String,
        speed: Option<PortSpeed>,
        duplex: Option<DuplexMode>,
    },
}

impl BatchRequest {
    /// Render this request into the batch of CLI lines it applies.
    pub fn to_batch(&self) -> Result<CommandBatch, CoreError> {
        let mut lines = match self {
            Self::CreateVlan { number, name } => {
                vec![format!("vlan {number}"), format!("name {name}")]
            }

            Self::AssignVlan {
                interface,
                mode,
                vlan,
            } => {
                let mut lines = vec![format!("interface {interface}")];
                // Older switches need the encapsulation set before the
                // port will accept trunk mode.
                if *mode == SwitchportMode::Trunk {
                    lines.push("switchport trunk encapsulation dot1q".into());
                }
                lines.push(format!("switchport mode {}", mode.as_str()));
                lines.push(match mode {
                    SwitchportMode::Access => format!("switchport access vlan {vlan}"),
                    SwitchportMode::Trunk => format!("switchport trunk allowed vlan {vlan}"),
                });
                lines
            }

            Self::AssignNativeVlan { interface, vlan } => vec![
                format!("interface {interface}"),
                format!("switchport trunk native vlan {vlan}"),
            ],

            Self::PortSecurity { interface, policy } => {
                vec![format!("interface {interface}"), policy.render()]
            }

            Self::SpeedDuplex {
                interface,
                speed,
                duplex,
            } => {
                if speed.is_none() && duplex.is_none() {
                    return Err(CoreError::Validation {
                        message: format!(
                            "speed/duplex change for {interface} sets neither speed nor duplex"
                        ),
                    });
                }
                let mut lines = vec![format!("interface {interface}")];
                if let Some(speed) = speed {
                    lines.push(format!("speed {speed}"));
                }
                if let Some(duplex) = duplex {
                    lines.push(format!("duplex {}", duplex.as_str()));
                }
                lines
            }
        };

        lines.push("write memory".into());
        CommandBatch::new(lines)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn create_vlan_lines() {
        let batch = BatchRequest::CreateVlan {
            number: 20,
            name: "voice".into(),
        }
        .to_batch()
        .expect("valid request");
        assert_eq!(batch.lines(), ["vlan 20", "name voice", "write memory"]);
    }

    #[test]
    fn assign_access_vlan_lines() {
        let batch = BatchRequest::AssignVlan {
            interface: "GigabitEthernet0/1".into(),
            mode: SwitchportMode::Access,
            vlan: 10,
        }
        .to_batch()
        .expect("valid request");
        assert_eq!(
            batch.lines(),
            [
                "interface GigabitEthernet0/1",
                "switchport mode access",
                "switchport access vlan 10",
                "write memory",
            ]
        );
    }

    #[test]
    fn assign_trunk_vlan_includes_encapsulation() {
        let batch = BatchRequest::AssignVlan {
            interface: "GigabitEthernet0/2".into(),
            mode: SwitchportMode::Trunk,
            vlan: 30,
        }
        .to_batch()
        .expect("valid request");
        assert_eq!(
            batch.lines(),
            [
                "interface GigabitEthernet0/2",
                "switchport trunk encapsulation dot1q",
                "switchport mode trunk",
                "switchport trunk allowed vlan 30",
                "write memory",
            ]
        );
    }

    #[test]
    fn native_vlan_lines() {
        let batch = BatchRequest::AssignNativeVlan {
            interface: "GigabitEthernet0/3".into(),
            vlan: 99,
        }
        .to_batch()
        .expect("valid request");
        assert_eq!(
            batch.lines(),
            [
                "interface GigabitEthernet0/3",
                "switchport trunk native vlan 99",
                "write memory",
            ]
        );
    }

    #[test]
    fn port_security_variants() {
        let max = BatchRequest::PortSecurity {
            interface: "Fa0/1".into(),
            policy: PortSecurityPolicy::Maximum(3),
        }
        .to_batch()
        .expect("valid request");
        assert_eq!(
            max.lines(),
            ["interface Fa0/1", "switchport port-security maximum 3", "write memory"]
        );

        let violation = BatchRequest::PortSecurity {
            interface: "Fa0/1".into(),
            policy: PortSecurityPolicy::Violation(ViolationMode::Restrict),
        }
        .to_batch()
        .expect("valid request");
        assert_eq!(
            violation.lines()[1],
            "switchport port-security violation restrict"
        );

        let aging = BatchRequest::PortSecurity {
            interface: "Fa0/1".into(),
            policy: PortSecurityPolicy::AgingType(AgingMode::Inactivity),
        }
        .to_batch()
        .expect("valid request");
        assert_eq!(
            aging.lines()[1],
            "switchport port-security aging type inactivity"
        );
    }

    #[test]
    fn speed_duplex_requires_one_setting() {
        let neither = BatchRequest::SpeedDuplex {
            interface: "Gi0/4".into(),
            speed: None,
            duplex: None,
        }
        .to_batch();
        assert!(matches!(neither, Err(CoreError::Validation { .. })));

        let both = BatchRequest::SpeedDuplex {
            interface: "Gi0/4".into(),
            speed: Some(PortSpeed::Thousand),
            duplex: Some(DuplexMode::Full),
        }
        .to_batch()
        .expect("valid request");
        assert_eq!(
            both.lines(),
            ["interface Gi0/4", "speed 1000", "duplex full", "write memory"]
        );
    }
}
