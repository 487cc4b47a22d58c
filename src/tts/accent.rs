use serde::{Deserialize, Serialize};

/// Regional narration voice, keyed by the label shown in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Accent {
    #[default]
    #[serde(rename = "US")]
    Us,
    #[serde(rename = "UK")]
    Uk,
    Australia,
    India,
    Canada,
}

impl Accent {
    pub const ALL: [Accent; 5] = [
        Accent::Us,
        Accent::Uk,
        Accent::Australia,
        Accent::India,
        Accent::Canada,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Accent::Us => "US",
            Accent::Uk => "UK",
            Accent::Australia => "Australia",
            Accent::India => "India",
            Accent::Canada => "Canada",
        }
    }

    /// Top-level domain of the Google host that speaks with this accent.
    pub fn tld(self) -> &'static str {
        match self {
            Accent::Us => "com",
            Accent::Uk => "co.uk",
            Accent::Australia => "com.au",
            Accent::India => "co.in",
            Accent::Canada => "ca",
        }
    }

    pub fn info(self) -> AccentInfo {
        AccentInfo {
            label: self.label().to_string(),
            tld: self.tld().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AccentInfo {
    pub label: String,
    pub tld: String,
}
