/// The three tabs of the organization view, each backed by its own cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Members,
    Assets,
    Reports,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Members, Section::Assets, Section::Reports];

    /// Get the display title for this section.
    pub fn title(&self) -> &'static str {
        match self {
            Section::Members => "Members",
            Section::Assets => "Assets",
            Section::Reports => "Reports",
        }
    }

    /// Parse a section name as typed on the command line
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "members" => Some(Section::Members),
            "assets" => Some(Section::Assets),
            "reports" => Some(Section::Reports),
            _ => None,
        }
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.title())
    }
}
