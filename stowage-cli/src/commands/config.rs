//! Showing the effective configuration

use anyhow::Result;
use stowage::config::StowageConfig;

/// Renders the configuration as TOML
///
/// # Errors
///
/// Returns an error if the configuration cannot be serialized
pub fn render(config: &StowageConfig) -> Result<String> {
    Ok(toml::to_string_pretty(config)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_round_trips_through_toml() {
        let config = StowageConfig::default();
        let rendered = render(&config).unwrap();

        assert!(rendered.contains("[storage]"));
        assert!(rendered.contains("[thumbnails]"));
        let parsed: StowageConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.thumbnails.max_width, config.thumbnails.max_width);
    }
}
