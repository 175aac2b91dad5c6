use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Checklists,
    Temperature,
    Cleaning,
    Cooking,
    Stock,
    Rota,
    Waste,
    HowTo,
    CcpManagement,
    HaccpDashboard,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "screen", content = "section")]
pub enum Screen {
    Login,
    SiteSelect,
    Home,
    Section(Section),
}

/// In-memory navigation. Nothing here is persisted: a restart lands on Login.
#[derive(Debug, Default, Clone)]
pub struct Navigator {
    user: Option<String>,
    site: Option<String>,
    section: Option<Section>,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn screen(&self) -> Screen {
        match (&self.user, &self.site, self.section) {
            (None, _, _) => Screen::Login,
            (Some(_), None, _) => Screen::SiteSelect,
            (Some(_), Some(_), None) => Screen::Home,
            (Some(_), Some(_), Some(section)) => Screen::Section(section),
        }
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn site(&self) -> Option<&str> {
        self.site.as_deref()
    }

    pub fn login(&mut self, name: &str) -> Result<Screen> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::validation("Pick a name to continue"));
        }
        self.user = Some(name.to_string());
        Ok(self.screen())
    }

    /// `sites` is the configured list; anything else is rejected.
    pub fn select_site(&mut self, site: &str, sites: &[String]) -> Result<Screen> {
        if self.user.is_none() {
            return Err(Error::validation("Log in before choosing a site"));
        }
        if !sites.iter().any(|s| s == site) {
            return Err(Error::validation(format!("Unknown site: {site}")));
        }
        self.site = Some(site.to_string());
        self.section = None;
        Ok(self.screen())
    }

    pub fn open(&mut self, section: Section) -> Result<Screen> {
        if self.site.is_none() {
            return Err(Error::validation("Choose a site first"));
        }
        self.section = Some(section);
        Ok(self.screen())
    }

    /// One level up: section → home → site picker. Never logs out.
    pub fn back(&mut self) -> Screen {
        if self.section.take().is_none() && self.user.is_some() {
            self.site = None;
        }
        self.screen()
    }

    pub fn change_site(&mut self) -> Screen {
        self.section = None;
        self.site = None;
        self.screen()
    }

    pub fn logout(&mut self) -> Screen {
        *self = Self::default();
        self.screen()
    }
}
