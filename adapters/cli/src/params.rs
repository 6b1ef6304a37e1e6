use anyhow::{Context, Result};
use clap::Args;
use dungeon_crawl_core::{CombatMode, Difficulty, QueryIssue, SessionParams};

/// Session parameters given as individual flags; each one wins over every other source.
#[derive(Args, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct ParamOverrides {
    /// Skin tone identifier, e.g. f1c27d
    #[arg(long)]
    pub(crate) skin: Option<String>,

    /// Clothing identifier, e.g. 0033cc
    #[arg(long)]
    pub(crate) clothes: Option<String>,

    /// Held prop identifier, or "none"
    #[arg(long)]
    pub(crate) prop: Option<String>,

    /// EASY, MEDIUM or HARD
    #[arg(long)]
    pub(crate) difficulty: Option<Difficulty>,

    /// ranged (fireball) or melee (sword)
    #[arg(long)]
    pub(crate) combat: Option<CombatMode>,

    /// Seed for a replayable session
    #[arg(long)]
    pub(crate) seed: Option<u64>,

    /// Number of enemies placed per session
    #[arg(long = "enemies")]
    pub(crate) enemy_count: Option<usize>,
}

impl ParamOverrides {
    fn apply(&self, params: &mut SessionParams) {
        if let Some(skin) = &self.skin {
            params.skin = skin.clone();
        }
        if let Some(clothes) = &self.clothes {
            params.clothes = clothes.clone();
        }
        if let Some(prop) = &self.prop {
            params.set_prop(prop);
        }
        if let Some(difficulty) = self.difficulty {
            params.difficulty = difficulty;
        }
        if let Some(combat) = self.combat {
            params.combat = combat;
        }
        if let Some(seed) = self.seed {
            params.seed = Some(seed);
        }
        if let Some(enemy_count) = self.enemy_count {
            params.enemy_count = enemy_count;
        }
    }
}

/// Layers defaults, the config file, the query string and the flags, in that order.
///
/// Problems in the query string do not fail resolution; they are returned
/// so the caller can report them.
pub(crate) fn resolve(
    config_file: Option<&str>,
    query: Option<&str>,
    overrides: &ParamOverrides,
) -> Result<(SessionParams, Vec<QueryIssue>)> {
    let mut params = match config_file {
        Some(contents) => {
            toml::from_str(contents).context("failed to parse session config toml contents")?
        }
        None => SessionParams::default(),
    };
    let issues = query
        .map(|query| params.apply_query(query))
        .unwrap_or_default();
    overrides.apply(&mut params);
    Ok((params, issues))
}

/// Human-readable description of a query problem.
pub(crate) fn describe(issue: &QueryIssue) -> String {
    match issue {
        QueryIssue::UnknownDifficulty(value) => {
            format!("unknown difficulty `{value}` in query, using HARD")
        }
        QueryIssue::UnknownCombatMode(value) => {
            format!("unknown combat mode `{value}` in query, ignored")
        }
        QueryIssue::InvalidSeed(value) => format!("seed `{value}` in query is not a number"),
        QueryIssue::UnknownKey(key) => format!("unknown query parameter `{key}`"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_any_source() {
        let (params, issues) =
            resolve(None, None, &ParamOverrides::default()).expect("defaults resolve");
        assert_eq!(params, SessionParams::default());
        assert_eq!(params.difficulty, Difficulty::Hard);
        assert!(issues.is_empty());
    }

    #[test]
    fn query_overrides_file_and_flags_override_query() {
        let file = r#"
            skin = "8d5524"
            clothes = "cc0000"
            difficulty = "MEDIUM"
            seed = 7
        "#;
        let overrides = ParamOverrides {
            clothes: Some("00cc00".to_owned()),
            ..ParamOverrides::default()
        };

        let (params, issues) = resolve(
            Some(file),
            Some("clothes=ffffff&difficulty=EASY&prop=sword"),
            &overrides,
        )
        .expect("sources resolve");

        assert!(issues.is_empty());
        assert_eq!(params.skin, "8d5524");
        assert_eq!(params.clothes, "00cc00");
        assert_eq!(params.difficulty, Difficulty::Easy);
        assert_eq!(params.prop.as_deref(), Some("sword"));
        assert_eq!(params.seed, Some(7));
    }

    #[test]
    fn unknown_query_difficulty_falls_back_to_hard_and_is_reported() {
        let file = r#"difficulty = "EASY""#;
        let (params, issues) = resolve(
            Some(file),
            Some("difficulty=nightmare"),
            &ParamOverrides::default(),
        )
        .expect("query issues do not fail resolution");

        assert_eq!(params.difficulty, Difficulty::Hard);
        assert_eq!(
            issues,
            vec![QueryIssue::UnknownDifficulty("nightmare".to_owned())]
        );
        assert!(describe(&issues[0]).contains("HARD"));
    }

    #[test]
    fn prop_flag_none_clears_the_prop() {
        let overrides = ParamOverrides {
            prop: Some("none".to_owned()),
            combat: Some(CombatMode::Melee),
            enemy_count: Some(2),
            ..ParamOverrides::default()
        };
        let (params, _) = resolve(None, Some("prop=torch"), &overrides).expect("resolves");

        assert_eq!(params.prop, None);
        assert_eq!(params.combat, CombatMode::Melee);
        assert_eq!(params.enemy_count, 2);
    }

    #[test]
    fn malformed_config_file_is_an_error() {
        let result = resolve(Some("difficulty = 3"), None, &ParamOverrides::default());
        assert!(result.is_err());
    }
}
