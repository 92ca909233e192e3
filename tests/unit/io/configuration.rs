//! Tests for TOML configuration loading and validation

#[cfg(test)]
mod tests {
    use chunkwfc::constraints::presets::Preset;
    use chunkwfc::io::configuration::{
        DEFAULT_CHUNK_SIZE, DEFAULT_MAX_ITERATIONS, DEFAULT_SEED, GeneratorConfig, MAX_CHUNK_SIZE,
        default_parallelism,
    };
    use chunkwfc::parallel::processor::ProcessorConfig;
    use chunkwfc::io::error::GenerationError;
    use std::path::Path;

    fn origin() -> &'static Path {
        Path::new("test.toml")
    }

    // Tests defaults are valid and match the published constants
    #[test]
    fn test_defaults() {
        let config = GeneratorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.seed, DEFAULT_SEED);
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(config.preset, Preset::Mountain);
        assert!(!config.parallel);
    }

    // Tests the concurrent-chunk cap follows the host's parallelism by default
    #[test]
    fn test_default_caps_follow_parallelism() {
        let host = default_parallelism();
        assert!(host >= 1);
        let processor = ProcessorConfig::default();
        assert_eq!(processor.max_threads, host);
        assert_eq!(processor.max_concurrent_chunks, host);
        let config = GeneratorConfig::default();
        assert_eq!(config.max_concurrent_chunks, host);
        assert_eq!(config.processor_config().max_concurrent_chunks, host);
    }

    // Tests a partial document overrides only the fields it names
    #[test]
    fn test_partial_document() {
        let config = GeneratorConfig::from_toml_str(
            "seed = 7\nchunk_size = 4\npreset = \"river\"\nparallel = true\nthreads = 2\n",
            origin(),
        )
        .expect("valid document");
        assert_eq!(config.seed, 7);
        assert_eq!(config.chunk_size, 4);
        assert_eq!(config.preset, Preset::River);
        assert!(config.parallel);
        assert_eq!(config.threads, Some(2));
        assert_eq!(config.max_iterations, DEFAULT_MAX_ITERATIONS);
    }

    // Tests unknown keys and bad types are decode errors
    #[test]
    fn test_rejects_malformed_documents() {
        for text in ["colour = 3", "seed = \"abc\"", "preset = \"volcano\"", "seed ="] {
            assert!(
                matches!(
                    GeneratorConfig::from_toml_str(text, origin()),
                    Err(GenerationError::Config { .. })
                ),
                "{text}"
            );
        }
    }

    // Tests out-of-range values name the offending field
    #[test]
    fn test_validation() {
        let too_big = format!("chunk_size = {}", MAX_CHUNK_SIZE + 1);
        let cases = [
            ("chunk_size = 0", "chunk_size"),
            (too_big.as_str(), "chunk_size"),
            ("state_count = 0", "state_count"),
            ("world_chunks = 0", "world_chunks"),
            ("max_iterations = 0", "max_iterations"),
            ("threads = 0", "threads"),
            ("write_back_stride = 0", "write_back_stride"),
        ];
        for (text, field) in cases {
            match GeneratorConfig::from_toml_str(text, origin()) {
                Err(GenerationError::InvalidParameter { parameter, .. }) => {
                    assert_eq!(parameter, field, "{text}");
                }
                other => panic!("expected invalid {field}, got {other:?}"),
            }
        }
    }

    // Tests derived processor and LOD settings
    #[test]
    fn test_derived_settings() {
        let config = GeneratorConfig {
            threads: Some(3),
            lod_level: 2,
            max_iterations: 400,
            write_back_stride: 2,
            ..GeneratorConfig::default()
        };
        let processor = config.processor_config();
        assert_eq!(processor.max_threads, 3);
        assert_eq!(processor.write_back_stride, 2);
        assert_eq!(processor.seed, config.seed);

        let lod = config.lod_settings();
        assert_eq!(lod.level, 2);
        assert_eq!(lod.max_iterations, 100);
    }

    // Tests loading from disk and a missing file
    #[test]
    fn test_load() {
        let dir = tempfile::tempdir().expect("temporary directory");
        let path = dir.path().join("world.toml");
        std::fs::write(&path, "world_chunks = 3\nlod_level = 1\n").expect("config written");

        let config = GeneratorConfig::load(&path).expect("valid file");
        assert_eq!(config.world_chunks, 3);
        assert_eq!(config.lod_level, 1);

        assert!(matches!(
            GeneratorConfig::load(&dir.path().join("absent.toml")),
            Err(GenerationError::FileSystem { .. })
        ));
    }
}
