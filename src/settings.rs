// Decides whether a tree needs a `settings.toml` row

pub const SETTINGS_FILE: &str = "settings.toml";

/// Libraries that read their configuration from `settings.toml`
pub fn default_settings_libraries() -> Vec<String> {
    [
        "adafruit_requests",
        "adafruit_esp32spi",
        "adafruit_minimqtt",
        "adafruit_portalbase",
        "adafruit_azureiot",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn strip_mpy(name: &str) -> &str {
    name.strip_suffix(".mpy").unwrap_or(name)
}

/// True when one of `names` is a settings-using library and the project does
/// not already ship its own `settings.toml`.
pub fn settings_required<'a, I>(names: I, libraries: &[String]) -> bool
where
    I: IntoIterator<Item = &'a str>,
{
    let mut needed = false;
    for name in names {
        if name == SETTINGS_FILE {
            return false;
        }
        let stem = strip_mpy(name);
        if libraries.iter().any(|lib| strip_mpy(lib) == stem) {
            needed = true;
        }
    }
    needed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_name_requires_settings() {
        let libs = default_settings_libraries();
        assert!(settings_required(["adafruit_minimqtt", "neopixel.mpy"], &libs));
    }

    #[test]
    fn test_file_name_requires_settings() {
        let libs = default_settings_libraries();
        assert!(settings_required(["adafruit_requests.mpy"], &libs));
    }

    #[test]
    fn test_existing_settings_file() {
        let libs = default_settings_libraries();
        assert!(!settings_required(["adafruit_requests.mpy", "settings.toml"], &libs));
    }

    #[test]
    fn test_unrelated_libraries() {
        let libs = default_settings_libraries();
        assert!(!settings_required(["neopixel.mpy", "adafruit_display_text"], &libs));
        assert!(!settings_required(Vec::<&str>::new(), &libs));
    }

    #[test]
    fn test_custom_library_list() {
        let libs = vec!["adafruit_io.mpy".to_string()];
        assert!(settings_required(["adafruit_io"], &libs));
        assert!(!settings_required(["adafruit_requests.mpy"], &libs));
    }
}
