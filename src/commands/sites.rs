use crate::config::Config;

pub fn get_sites(config: &Config) -> Vec<String> {
    config.sites.clone()
}
