use taskwire_codec::Serializer;
use taskwire_frame::FrameConfig;

/// Server behavior configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Number of acceptor threads sharing the listening socket.
    pub acceptors: usize,
    /// Number of pool threads running workers. The concurrency ceiling.
    pub pool_size: usize,
    /// Accepted connections that may wait for a free pool thread before
    /// further connections are rejected.
    pub queue_depth: usize,
    /// Frame codec limits applied per connection.
    pub frame: FrameConfig,
    /// The serializer outputs are encoded with and inputs decoded with.
    pub serializer: Serializer,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            acceptors: 1,
            pool_size: 8,
            queue_depth: 64,
            frame: FrameConfig::default(),
            serializer: Serializer::Plain,
        }
    }
}

impl ServerConfig {
    /// Override the acceptor thread count.
    pub fn with_acceptors(mut self, acceptors: usize) -> Self {
        self.acceptors = acceptors.max(1);
        self
    }

    /// Override the worker pool size.
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size.max(1);
        self
    }

    /// Override the pending-connection queue depth.
    pub fn with_queue_depth(mut self, queue_depth: usize) -> Self {
        self.queue_depth = queue_depth;
        self
    }

    /// Override frame codec limits.
    pub fn with_frame(mut self, frame: FrameConfig) -> Self {
        self.frame = frame;
        self
    }

    /// Override the configured serializer.
    pub fn with_serializer(mut self, serializer: Serializer) -> Self {
        self.serializer = serializer;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_override_defaults() {
        let config = ServerConfig::default()
            .with_acceptors(3)
            .with_pool_size(16)
            .with_queue_depth(4)
            .with_serializer(Serializer::compressed(Serializer::Plain));

        assert_eq!(config.acceptors, 3);
        assert_eq!(config.pool_size, 16);
        assert_eq!(config.queue_depth, 4);
        assert_eq!(
            config.serializer,
            Serializer::compressed(Serializer::Plain)
        );
    }

    #[test]
    fn thread_counts_are_at_least_one() {
        let config = ServerConfig::default().with_acceptors(0).with_pool_size(0);
        assert_eq!(config.acceptors, 1);
        assert_eq!(config.pool_size, 1);
    }
}
