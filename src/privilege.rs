//! Privilege escalation configuration.
//!
//! Installing the toolchain and driving pbuilder both need root. The
//! orchestrator wraps those commands in `sudo` by default; a profile may pick
//! `doas` instead or disable escalation when the build already runs as root.

use serde::{Deserialize, Serialize};

/// Privilege escalation method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivilegeMethod {
    /// Use `sudo` for privilege escalation.
    #[default]
    Sudo,
    /// Use `doas` for privilege escalation.
    Doas,
}

impl PrivilegeMethod {
    /// Returns the command name for this privilege method.
    pub fn command_name(&self) -> &'static str {
        match self {
            Self::Sudo => "sudo",
            Self::Doas => "doas",
        }
    }
}

impl std::fmt::Display for PrivilegeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.command_name())
    }
}

/// Privilege escalation setting for the privileged build steps.
///
/// This type supports the following YAML representations:
/// - Absent (field not specified) or `privilege: true` → `Method(Sudo)`
/// - `privilege: false` → `Disabled` (commands run as-is)
/// - `privilege: { method: doas }` → `Method(Doas)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Privilege {
    /// No privilege escalation.
    Disabled,
    /// Wrap privileged commands with the given method.
    Method(PrivilegeMethod),
}

impl Default for Privilege {
    fn default() -> Self {
        Self::Method(PrivilegeMethod::default())
    }
}

impl Privilege {
    /// Returns the method to wrap privileged commands with, or `None` when disabled.
    pub fn method(&self) -> Option<PrivilegeMethod> {
        match self {
            Self::Disabled => None,
            Self::Method(m) => Some(*m),
        }
    }
}

impl<'de> Deserialize<'de> for Privilege {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de;

        struct PrivilegeVisitor;

        impl<'de> de::Visitor<'de> for PrivilegeVisitor {
            type Value = Privilege;

            fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                formatter.write_str("a boolean or a map with a 'method' field")
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Privilege::default())
            }

            fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                if v {
                    Ok(Privilege::default())
                } else {
                    Ok(Privilege::Disabled)
                }
            }

            fn visit_map<A>(self, map: A) -> Result<Self::Value, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                #[derive(Deserialize)]
                #[serde(deny_unknown_fields)]
                struct PrivilegeMap {
                    method: PrivilegeMethod,
                }
                let pm = PrivilegeMap::deserialize(de::value::MapAccessDeserializer::new(map))?;
                Ok(Privilege::Method(pm.method))
            }
        }

        deserializer.deserialize_any(PrivilegeVisitor)
    }
}

impl Serialize for Privilege {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Self::Disabled => serializer.serialize_bool(false),
            Self::Method(method) => {
                use serde::ser::SerializeMap;
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("method", method)?;
                map.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn privilege_method_command_name() {
        assert_eq!(PrivilegeMethod::Sudo.command_name(), "sudo");
        assert_eq!(PrivilegeMethod::Doas.command_name(), "doas");
    }

    #[test]
    fn privilege_method_display() {
        assert_eq!(PrivilegeMethod::Sudo.to_string(), "sudo");
        assert_eq!(PrivilegeMethod::Doas.to_string(), "doas");
    }

    #[test]
    fn privilege_default_is_sudo() {
        assert_eq!(Privilege::default(), Privilege::Method(PrivilegeMethod::Sudo));
        assert_eq!(Privilege::default().method(), Some(PrivilegeMethod::Sudo));
    }

    #[test]
    fn privilege_deserialize_true() {
        let p: Privilege = serde_yaml::from_str("true").unwrap();
        assert_eq!(p, Privilege::Method(PrivilegeMethod::Sudo));
    }

    #[test]
    fn privilege_deserialize_false() {
        let p: Privilege = serde_yaml::from_str("false").unwrap();
        assert_eq!(p, Privilege::Disabled);
        assert_eq!(p.method(), None);
    }

    #[test]
    fn privilege_deserialize_method_doas() {
        let p: Privilege = serde_yaml::from_str("method: doas").unwrap();
        assert_eq!(p, Privilege::Method(PrivilegeMethod::Doas));
    }

    #[test]
    fn privilege_deserialize_null_is_default() {
        let p: Privilege = serde_yaml::from_str("~").unwrap();
        assert_eq!(p, Privilege::default());
    }

    #[test]
    fn privilege_rejects_unknown_field() {
        let result: Result<Privilege, _> = serde_yaml::from_str("method: sudo\nextra: bad");
        assert!(result.is_err());
    }

    #[test]
    fn privilege_rejects_invalid_method() {
        let result: Result<Privilege, _> = serde_yaml::from_str("method: pkexec");
        assert!(result.is_err(), "pkexec should not be a valid privilege method");
    }

    #[test]
    fn privilege_rejects_plain_string() {
        let result: Result<Privilege, _> = serde_yaml::from_str("\"sudo\"");
        assert!(result.is_err(), "plain string should not be valid for Privilege");
    }

    #[test]
    fn privilege_serializes_disabled_as_false() {
        let yaml = serde_yaml::to_string(&Privilege::Disabled).unwrap();
        assert_eq!(yaml.trim(), "false");
    }
}
