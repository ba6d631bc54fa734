use serde::{Deserialize, Serialize};

/// Output size in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Allowed head height range in output pixels, inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadSize {
    pub min: u32,
    pub max: u32,
}

impl HeadSize {
    pub fn contains(&self, height: u32) -> bool {
        (self.min..=self.max).contains(&height)
    }
}

/// Photo requirements for one issuing country.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CountryProfile {
    /// ISO 3166-1 alpha-2 code, upper case.
    pub code: String,
    pub name: String,
    pub dimensions: Dimensions,
    pub head_size: HeadSize,
    pub instructions: String,
    #[serde(default)]
    pub criteria: Vec<String>,
}

impl CountryProfile {
    /// Reason the profile cannot be used, if any.
    pub fn problem(&self) -> Option<String> {
        if self.code.trim().is_empty() {
            return Some("empty country code".into());
        }
        if self.dimensions.width == 0 || self.dimensions.height == 0 {
            return Some(format!(
                "invalid dimensions {}x{}",
                self.dimensions.width, self.dimensions.height
            ));
        }
        if self.head_size.min > self.head_size.max {
            return Some(format!(
                "head size min {} exceeds max {}",
                self.head_size.min, self.head_size.max
            ));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> CountryProfile {
        CountryProfile {
            code: "US".into(),
            name: "United States".into(),
            dimensions: Dimensions {
                width: 600,
                height: 600,
            },
            head_size: HeadSize { min: 300, max: 412 },
            instructions: String::new(),
            criteria: Vec::new(),
        }
    }

    #[test]
    fn test_head_size_bounds_are_inclusive() {
        let hs = profile().head_size;
        assert!(hs.contains(300));
        assert!(hs.contains(412));
        assert!(!hs.contains(299));
        assert!(!hs.contains(413));
    }

    #[test]
    fn test_valid_profile_has_no_problem() {
        assert!(profile().problem().is_none());
    }

    #[test]
    fn test_zero_dimensions_are_a_problem() {
        let mut p = profile();
        p.dimensions.height = 0;
        assert!(p.problem().is_some());
    }

    #[test]
    fn test_inverted_head_size_is_a_problem() {
        let mut p = profile();
        p.head_size = HeadSize { min: 500, max: 100 };
        assert!(p.problem().is_some());
    }
}
