use crate::domain::model::Anime;

pub const DEFAULT_CUTOFF: f64 = 0.6;
pub const DEFAULT_MAX_CANDIDATES: usize = 3;

/// 將使用者輸入的名稱對應到搜尋結果中最接近的標題
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TitleMatcher {
    pub cutoff: f64,
    pub max_candidates: usize,
}

impl Default for TitleMatcher {
    fn default() -> Self {
        Self {
            cutoff: DEFAULT_CUTOFF,
            max_candidates: DEFAULT_MAX_CANDIDATES,
        }
    }
}

impl TitleMatcher {
    pub fn new(cutoff: f64, max_candidates: usize) -> Self {
        Self {
            cutoff,
            max_candidates,
        }
    }

    pub fn similarity(a: &str, b: &str) -> f64 {
        strsim::normalized_levenshtein(&a.to_lowercase(), &b.to_lowercase())
    }

    /// 回傳分數達到門檻的候選標題，分數由高到低
    pub fn close_matches<'a, I>(&self, word: &str, candidates: I) -> Vec<(&'a str, f64)>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut scored: Vec<(&'a str, f64)> = candidates
            .into_iter()
            .map(|candidate| (candidate, Self::similarity(word, candidate)))
            .filter(|(_, score)| *score >= self.cutoff)
            .collect();

        // sort_by 是穩定排序，同分時保留原順序
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(self.max_candidates);
        scored
    }

    pub fn best_match<'a>(&self, name: &str, animes: &'a [Anime]) -> Option<&'a Anime> {
        let mut best: Option<(&'a Anime, f64)> = None;

        for anime in animes {
            let Some((title, score)) = self.close_matches(name, anime.titles()).into_iter().next() else {
                continue;
            };
            tracing::debug!("'{}' ~ '{}' ({:.3})", name, title, score);

            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((anime, score));
            }
        }

        match best {
            Some((anime, score)) => {
                tracing::debug!("Best match for '{}' is '{}' ({:.3})", name, anime.title, score);
                Some(anime)
            }
            None => {
                tracing::info!("No close match for '{}' among {} results", name, animes.len());
                None
            }
        }
    }
}
