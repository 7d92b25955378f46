//! Corpus statistics

use crate::roots::RootIndex;
use crate::schemes::SchemeStore;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct RootStat {
    pub text: String,
    pub derivatives: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_roots: usize,
    pub total_schemes: usize,
    pub total_derivatives: usize,
    /// Average number of distinct derivatives per root
    pub density: f64,
    pub roots: Vec<RootStat>,
}

pub fn collect(roots: &RootIndex, schemes: &SchemeStore) -> Statistics {
    let per_root: Vec<RootStat> = roots
        .iter()
        .map(|root| RootStat {
            text: root.text.clone(),
            derivatives: root.derivatives.iter().map(|d| d.word.clone()).collect(),
        })
        .collect();

    let total_roots = per_root.len();
    let total_derivatives: usize = per_root.iter().map(|r| r.derivatives.len()).sum();

    Statistics {
        total_roots,
        total_schemes: schemes.len(),
        total_derivatives,
        density: total_derivatives as f64 / total_roots.max(1) as f64,
        roots: per_root,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_density() {
        let mut roots = RootIndex::new();
        for (root, words) in [
            ("كتب", ["كاتب", "مكتوب"]),
            ("درس", ["دارس", "مدروس"]),
            ("علم", ["عالم", "معلوم"]),
        ] {
            for word in words {
                roots.append_derivative(root, word);
            }
        }
        let mut schemes = SchemeStore::new();
        schemes.put("فاعل", "{1}ا{2}{3}");

        let stats = collect(&roots, &schemes);
        assert_eq!(stats.total_roots, 3);
        assert_eq!(stats.total_schemes, 1);
        assert_eq!(stats.total_derivatives, 6);
        assert_eq!(stats.density, 2.0);
        assert_eq!(stats.roots[0].text, "درس");
    }

    #[test]
    fn test_repeated_word_counts_once() {
        let mut roots = RootIndex::new();
        roots.append_derivative("كتب", "كاتب");
        roots.append_derivative("كتب", "كاتب");
        let stats = collect(&roots, &SchemeStore::new());
        assert_eq!(stats.total_derivatives, 1);
    }

    #[test]
    fn test_empty_corpus() {
        let stats = collect(&RootIndex::new(), &SchemeStore::new());
        assert_eq!(stats.total_roots, 0);
        assert_eq!(stats.density, 0.0);

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["totalSchemes"], 0);
        assert!(json.get("total_schemes").is_none());
    }
}
