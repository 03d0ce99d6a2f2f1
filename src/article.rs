use chrono::{DateTime, Utc};
use std::fmt;

//________________________________________________________________________________________________________________________

/// A wiki, identified by language code and project family, e.g. `en` + `wikipedia`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Site {
    lang: String,
    family: String,
}

impl Site {
    pub fn new(lang: &str, family: &str) -> Self {
        Self {
            lang: lang.trim().to_string(),
            family: family.trim().to_string(),
        }
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn host(&self) -> String {
        match self.family.as_str() {
            "wikidata" => "www.wikidata.org".to_string(),
            "commons" => "commons.wikimedia.org".to_string(),
            "meta" => "meta.wikimedia.org".to_string(),
            family => format!("{}.{family}.org", self.lang),
        }
    }

    pub fn api_url(&self) -> String {
        format!("https://{}/w/api.php", self.host())
    }

    /// The project name used by the Wikimedia REST API, e.g. `de.wikipedia`
    pub fn rest_project(&self) -> String {
        format!("{}.{}", self.lang, self.family)
    }

    /// The Wikidata sitelink key, e.g. `enwiki` or `dewikisource`
    pub fn wikidata_site_id(&self) -> String {
        let lang = self.lang.replace('-', "_");
        match self.family.as_str() {
            "wikipedia" => format!("{lang}wiki"),
            family => format!("{lang}{family}"),
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.lang, self.family)
    }
}

//________________________________________________________________________________________________________________________

/// Handle for one page on one site. Titles are kept in their pretty form (spaces).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArticleRef {
    site: Site,
    title: String,
}

impl ArticleRef {
    pub fn new(site: Site, title: &str) -> Self {
        Self {
            site,
            title: title.trim().replace('_', " "),
        }
    }

    pub const fn site(&self) -> &Site {
        &self.site
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn with_underscores(&self) -> String {
        self.title.replace(' ', "_")
    }

    /// Title without a trailing `#section` part
    pub fn title_without_section(&self) -> &str {
        match self.title.split_once('#') {
            Some((page, _section)) => page.trim_end(),
            None => &self.title,
        }
    }

    /// The label a case gets in langlinks mode, `lang:Title`
    pub fn lang_label(&self) -> String {
        format!("{}:{}", self.site.lang(), self.title)
    }
}

impl fmt::Display for ArticleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.site, self.title)
    }
}

//________________________________________________________________________________________________________________________

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    pub timestamp: DateTime<Utc>,
    /// None if the user name was suppressed
    pub user: Option<String>,
}

impl Revision {
    pub fn new(timestamp: DateTime<Utc>, user: Option<&str>) -> Self {
        Self {
            timestamp,
            user: user.map(|u| u.to_string()),
        }
    }
}
