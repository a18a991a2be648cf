//! Matcher configuration
//!
//! Configuration is built once and handed to
//! [`PatternMatcher::with_config`](super::PatternMatcher::with_config).
//!
//! ```ignore
//! let config = MatcherConfig::builder()
//!     .enable_const_value_match()
//!     .enable_ir_attr_match()
//!     .build();
//! ```

/// Immutable matcher configuration
///
/// All options are disabled by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatcherConfig {
    const_value_match: bool,
    ir_attr_match: bool,
    force_self_contained: bool,
}

impl MatcherConfig {
    /// Start building a configuration
    pub fn builder() -> MatcherConfigBuilder {
        MatcherConfigBuilder::default()
    }

    /// Constant pattern nodes only match constants with an equal value
    pub fn const_value_match(&self) -> bool {
        self.const_value_match
    }

    /// Attributes declared on pattern nodes must be equal on the target
    pub fn ir_attr_match(&self) -> bool {
        self.ir_attr_match
    }

    /// Declared outputs may also be consumed inside the pattern
    pub fn force_self_contained(&self) -> bool {
        self.force_self_contained
    }
}

/// Builder for [`MatcherConfig`]
#[derive(Debug, Clone, Default)]
pub struct MatcherConfigBuilder {
    config: MatcherConfig,
}

impl MatcherConfigBuilder {
    /// Require equal materialized values on constant nodes
    pub fn enable_const_value_match(mut self) -> Self {
        self.config.const_value_match = true;
        self
    }

    /// Require equal attribute values for every attribute on a pattern node
    pub fn enable_ir_attr_match(mut self) -> Self {
        self.config.ir_attr_match = true;
        self
    }

    /// Allow declaring an output that is also consumed inside the pattern
    ///
    /// This is how a caller exposes an intermediate tensor that the target
    /// consumes outside the matched region.
    pub fn enable_force_self_contained(mut self) -> Self {
        self.config.force_self_contained = true;
        self
    }

    /// Finish the configuration
    pub fn build(self) -> MatcherConfig {
        self.config
    }
}
