use crate::core::config::data::Config;

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

impl Config {
    /// Lines describing every setting, marking the ones left at their default.
    pub fn describe(&self) -> Vec<String> {
        fn entry(key: &str, value: impl std::fmt::Display, explicit: bool) -> String {
            if explicit {
                format!("  {key}: {value}")
            } else {
                format!("  {key}: {value} (default)")
            }
        }

        let generation = self.generation_config();
        vec![
            entry("model", self.model(), self.model.is_some()),
            entry("base-url", self.base_url(), self.base_url.is_some()),
            entry("theme", self.theme(), self.theme.is_some()),
            entry("language", self.language(), self.language.is_some()),
            entry("markdown", on_off(self.markdown_enabled()), self.markdown.is_some()),
            entry("syntax", on_off(self.syntax_enabled()), self.syntax.is_some()),
            entry(
                "timeout",
                format!("{}s", self.request_timeout().as_secs()),
                self.request_timeout_secs.is_some(),
            ),
            entry(
                "generation",
                format!(
                    "temperature={} top_k={} top_p={} max_output_tokens={}",
                    generation.temperature,
                    generation.top_k,
                    generation.top_p,
                    generation.max_output_tokens
                ),
                !self.generation.is_empty(),
            ),
        ]
    }

    pub fn print_all(&self) {
        println!("Current configuration:");
        for line in self.describe() {
            println!("{line}");
        }
    }
}
