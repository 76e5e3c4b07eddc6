//! Dispatcher configuration.

/// Configuration options for a [`Dispatcher`](super::Dispatcher)
#[derive(Debug, Clone, Default)]
pub struct DispatcherConfig {
    /// Send `Response::Error` to the requester instead of dropping silently
    pub error_responses: bool,
}

impl DispatcherConfig {
    /// Create a new configuration builder
    pub fn builder() -> DispatcherConfigBuilder {
        DispatcherConfigBuilder::default()
    }

    /// Enable or disable explicit error responses
    pub fn with_error_responses(mut self, enable: bool) -> Self {
        self.error_responses = enable;
        self
    }
}

/// Builder for DispatcherConfig
#[derive(Default)]
pub struct DispatcherConfigBuilder {
    config: DispatcherConfig,
}

impl DispatcherConfigBuilder {
    /// Build the configuration
    pub fn build(self) -> DispatcherConfig {
        self.config
    }

    /// Answer failed requests with an explicit error response
    pub fn enable_error_responses(mut self) -> Self {
        self.config.error_responses = true;
        self
    }

    /// Drop failed requests silently (the default)
    pub fn disable_error_responses(mut self) -> Self {
        self.config.error_responses = false;
        self
    }
}
