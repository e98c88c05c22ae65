//! Command argument builder shared by the pipeline steps.

use std::fmt::Display;

/// Defines how a flag and its value are rendered in command arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagValueStyle {
    /// Render flag and value as separate arguments: `--flag value`.
    Separate,
    /// Render flag and value as a single argument: `-Ivalue`.
    Joined,
}

/// Builder for assembling command arguments consistently across steps.
#[derive(Debug, Default)]
pub struct CommandArgsBuilder {
    args: Vec<String>,
}

impl CommandArgsBuilder {
    /// Create a new, empty builder.
    pub fn new() -> Self {
        Self { args: Vec::new() }
    }

    /// Append a raw argument to the builder.
    pub fn push_arg(&mut self, arg: impl Display) -> &mut Self {
        self.args.push(arg.to_string());
        self
    }

    /// Append a flag with value. Empty values are skipped together with the flag.
    pub fn push_flag_value(
        &mut self,
        flag: &str,
        value: impl Display,
        style: FlagValueStyle,
    ) -> &mut Self {
        let value = value.to_string();
        if value.is_empty() {
            return self;
        }

        match style {
            FlagValueStyle::Separate => {
                self.args.push(flag.to_string());
                self.args.push(value);
            }
            FlagValueStyle::Joined => {
                self.args.push(format!("{}{}", flag, value));
            }
        }
        self
    }

    /// Append a flag for each non-empty value in `values`.
    pub fn push_flag_values<I, V>(
        &mut self,
        flag: &str,
        values: I,
        style: FlagValueStyle,
    ) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Display,
    {
        for value in values {
            self.push_flag_value(flag, value, style);
        }
        self
    }

    /// Return the collected arguments.
    pub fn into_args(self) -> Vec<String> {
        self.args
    }
}
