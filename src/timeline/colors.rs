use std::collections::HashMap;

/// Palette assigned to part/program names in first-seen order.
pub const PALETTE: [&str; 10] = [
    "#0088FE", "#00C49F", "#FFBB28", "#FF8042", "#8884d8", "#A55D35", "#D0B7B1", "#A58FAA",
    "#DDA0DD", "#5F9EA0",
];

/// Color for names that were not part of the batch the map was built from.
pub const FALLBACK_COLOR: &str = "#d38181";

/// Name to color assignment for one fetched batch.
///
/// The n-th distinct name gets `PALETTE[n % 10]`, so the map is a pure
/// function of the input order. It is rebuilt whenever new data arrives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorMap {
    order: Vec<(String, &'static str)>,
    index: HashMap<String, usize>,
}

impl ColorMap {
    pub fn build<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut map = Self::default();
        for name in names {
            let name = name.as_ref();
            if map.index.contains_key(name) {
                continue;
            }
            let color = PALETTE[map.order.len() % PALETTE.len()];
            map.index.insert(name.to_string(), map.order.len());
            map.order.push((name.to_string(), color));
        }
        map
    }

    #[must_use]
    pub fn color_of(&self, name: &str) -> &'static str {
        self.index
            .get(name)
            .map_or(FALLBACK_COLOR, |&i| self.order[i].1)
    }

    /// Entries in first-seen order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &'static str)> {
        self.order.iter().map(|(name, color)| (name.as_str(), *color))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
