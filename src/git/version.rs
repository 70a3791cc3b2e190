/// Version information for the git binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub raw: String,
}

impl GitVersion {
    /// Parse output like "git version 2.43.0" or "git version 2.39.3 (Apple Git-145)"
    pub fn parse(version_str: &str) -> Option<Self> {
        let version_part = version_str
            .split_whitespace()
            .find(|part| part.starts_with(|c: char| c.is_ascii_digit()))?;

        let mut nums = version_part.split('.').map(|n| {
            n.chars()
                .take_while(char::is_ascii_digit)
                .collect::<String>()
                .parse::<u32>()
        });

        let major = nums.next()?.ok()?;
        let minor = nums.next().and_then(Result::ok).unwrap_or(0);
        let patch = nums.next().and_then(Result::ok).unwrap_or(0);

        Some(Self {
            major,
            minor,
            patch,
            raw: version_str.trim().to_string(),
        })
    }

    /// Parse a bare requirement like "2.28" from configuration
    pub fn parse_requirement(requirement: &str) -> Option<(u32, u32)> {
        let mut parts = requirement.trim().split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts
            .next()
            .map(str::parse::<u32>)
            .transpose()
            .ok()?
            .unwrap_or(0);
        Some((major, minor))
    }

    /// Check if this version meets the minimum requirement
    pub fn meets_minimum(&self, min_major: u32, min_minor: u32) -> bool {
        self.major > min_major || (self.major == min_major && self.minor >= min_minor)
    }
}

impl std::fmt::Display for GitVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
