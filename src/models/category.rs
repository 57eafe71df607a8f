use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt::Display, str::FromStr};

/// News category offered to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    World,
    Technology,
    Sports,
    Entertainment,
    Lifestyle,
    Health,
    Politics,
}

/// Category to ordered list of feed URLs
pub type FeedTable = BTreeMap<Category, Vec<String>>;

impl Category {
    pub const ALL: [Category; 7] = [
        Category::World,
        Category::Technology,
        Category::Sports,
        Category::Entertainment,
        Category::Lifestyle,
        Category::Health,
        Category::Politics,
    ];

    /// Lowercase identifier used in URLs and cache keys
    pub fn slug(&self) -> &'static str {
        match self {
            Category::World => "world",
            Category::Technology => "technology",
            Category::Sports => "sports",
            Category::Entertainment => "entertainment",
            Category::Lifestyle => "lifestyle",
            Category::Health => "health",
            Category::Politics => "politics",
        }
    }

    /// Free-text query used when falling back to news search
    pub fn search_term(&self) -> String {
        format!("{} news", self.slug())
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Category::World => "World",
            Category::Technology => "Technology",
            Category::Sports => "Sports",
            Category::Entertainment => "Entertainment",
            Category::Lifestyle => "Lifestyle",
            Category::Health => "Health",
            Category::Politics => "Politics",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.slug() == wanted)
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

/// Built-in feed table
pub fn default_feed_table() -> FeedTable {
    let feeds: [(Category, &[&str]); 7] = [
        (
            Category::World,
            &[
                "https://rss.nytimes.com/services/xml/rss/nyt/World.xml",
                "https://www.theguardian.com/world/rss",
                "https://www.aljazeera.com/xml/rss/all.xml",
            ],
        ),
        (
            Category::Technology,
            &[
                "https://rss.nytimes.com/services/xml/rss/nyt/Technology.xml",
                "https://www.theverge.com/rss/index.xml",
                "https://www.wired.com/feed/rss",
            ],
        ),
        (
            Category::Sports,
            &[
                "https://www.espn.com/espn/rss/news",
                "https://www.skysports.com/rss/12040",
                "https://feeds.bbci.co.uk/sport/rss.xml",
            ],
        ),
        (
            Category::Entertainment,
            &[
                "https://www.billboard.com/feed/",
                "https://www.etonline.com/rss",
                "https://www.rollingstone.com/feed/",
            ],
        ),
        (
            Category::Lifestyle,
            &[
                "https://www.refinery29.com/en-us/feed.xml",
                "https://rss.nytimes.com/services/xml/rss/nyt/FashionandStyle.xml",
            ],
        ),
        (
            Category::Health,
            &[
                "https://www.medicalnewstoday.com/rss",
                "https://www.nhs.uk/news/feed.rss",
            ],
        ),
        (
            Category::Politics,
            &[
                "https://www.politico.com/rss/politics.xml",
                "https://www.theguardian.com/politics/rss",
            ],
        ),
    ];

    feeds
        .into_iter()
        .map(|(category, urls)| (category, urls.iter().map(|u| u.to_string()).collect()))
        .collect()
}
