//! Static achievement catalog.
//!
//! The catalog is bundled data, never mutated at runtime. Every node carries
//! its unlock rule and an optional list of prerequisite node ids forming a
//! DAG (cycles are not expected and not checked). Node order matters: the
//! evaluator walks the catalog top to bottom in a single pass, so a chain
//! unlocks in one evaluation only if its links are declared in order.

use crate::library::{MediaItem, MediaStatus, MediaType, Review};
use crate::user::UserProfile;
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementCategory {
    Games,
    Books,
    Cinema,
    Reviews,
    Profile,
    Variety,
}

impl AchievementCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AchievementCategory::Games => "games",
            AchievementCategory::Books => "books",
            AchievementCategory::Cinema => "cinema",
            AchievementCategory::Reviews => "reviews",
            AchievementCategory::Profile => "profile",
            AchievementCategory::Variety => "variety",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementRarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

/// Unlock predicate, evaluated against the user's in-memory collections.
#[derive(Debug, Clone, Copy)]
pub enum UnlockRule {
    /// At least `count` items, optionally filtered by type and status.
    ItemsAtLeast {
        media_type: Option<MediaType>,
        status: Option<MediaStatus>,
        count: usize,
    },
    /// A completed item of the given type with at least `min_hours` logged.
    CompletedWithHours {
        media_type: MediaType,
        min_hours: f64,
    },
    /// Completed items spanning at least `count` distinct media types.
    CompletedTypeSpread { count: usize },
    ReviewsAtLeast { count: usize },
    /// Any review whose plain text is at least `chars` characters long.
    ReviewLengthAtLeast { chars: usize },
    /// At least `count` items rated `rating` or higher.
    RatedAtLeast { rating: u8, count: usize },
    FavoritesAtLeast { count: usize },
    /// Display name, avatar and bio are all set.
    ProfileComplete,
    /// Total hours logged across the whole library.
    TotalHoursAtLeast { hours: f64 },
}

impl UnlockRule {
    pub fn matches(
        &self,
        media_items: &[MediaItem],
        reviews: &[Review],
        profile: Option<&UserProfile>,
    ) -> bool {
        match self {
            UnlockRule::ItemsAtLeast {
                media_type,
                status,
                count,
            } => {
                media_items
                    .iter()
                    .filter(|item| media_type.is_none_or(|t| item.media_type == t))
                    .filter(|item| status.is_none_or(|s| item.status == s))
                    .count()
                    >= *count
            }
            UnlockRule::CompletedWithHours {
                media_type,
                min_hours,
            } => media_items.iter().any(|item| {
                item.media_type == *media_type
                    && item.status == MediaStatus::Completed
                    && item.hours_spent.is_some_and(|h| h >= *min_hours)
            }),
            UnlockRule::CompletedTypeSpread { count } => {
                media_items
                    .iter()
                    .filter(|item| item.status == MediaStatus::Completed)
                    .map(|item| item.media_type)
                    .collect::<HashSet<_>>()
                    .len()
                    >= *count
            }
            UnlockRule::ReviewsAtLeast { count } => reviews.len() >= *count,
            UnlockRule::ReviewLengthAtLeast { chars } => reviews
                .iter()
                .any(|review| review.content.char_count() >= *chars),
            UnlockRule::RatedAtLeast { rating, count } => {
                media_items
                    .iter()
                    .filter(|item| item.rating.is_some_and(|r| r >= *rating))
                    .count()
                    >= *count
            }
            UnlockRule::FavoritesAtLeast { count } => {
                media_items.iter().filter(|item| item.favorite).count() >= *count
            }
            UnlockRule::ProfileComplete => profile.is_some_and(UserProfile::is_complete),
            UnlockRule::TotalHoursAtLeast { hours } => {
                media_items
                    .iter()
                    .filter_map(|item| item.hours_spent)
                    .sum::<f64>()
                    >= *hours
            }
        }
    }
}

pub struct AchievementNode {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub image: &'static str,
    pub category: AchievementCategory,
    pub rarity: AchievementRarity,
    pub depends_on: &'static [&'static str],
    /// (column, row) in the achievement tree layout.
    pub position: (u8, u8),
    pub rule: UnlockRule,
}

pub const CATALOG: &[AchievementNode] = &[
    AchievementNode {
        id: "primeiro_game",
        title: "Primeiro Game",
        description: "Adicione seu primeiro game à estante.",
        image: "/achievements/primeiro_game.png",
        category: AchievementCategory::Games,
        rarity: AchievementRarity::Common,
        depends_on: &[],
        position: (0, 0),
        rule: UnlockRule::ItemsAtLeast {
            media_type: Some(MediaType::Game),
            status: None,
            count: 1,
        },
    },
    AchievementNode {
        id: "completou_primeiro_game",
        title: "Zerou!",
        description: "Complete seu primeiro game.",
        image: "/achievements/completou_primeiro_game.png",
        category: AchievementCategory::Games,
        rarity: AchievementRarity::Common,
        depends_on: &["primeiro_game"],
        position: (0, 1),
        rule: UnlockRule::ItemsAtLeast {
            media_type: Some(MediaType::Game),
            status: Some(MediaStatus::Completed),
            count: 1,
        },
    },
    AchievementNode {
        id: "viciado_em_horas",
        title: "Viciado em Horas",
        description: "Complete um game com 100 horas ou mais.",
        image: "/achievements/viciado_em_horas.png",
        category: AchievementCategory::Games,
        rarity: AchievementRarity::Rare,
        depends_on: &["completou_primeiro_game"],
        position: (0, 2),
        rule: UnlockRule::CompletedWithHours {
            media_type: MediaType::Game,
            min_hours: 100.0,
        },
    },
    AchievementNode {
        id: "colecionador_de_games",
        title: "Colecionador",
        description: "Catalogue 10 games.",
        image: "/achievements/colecionador_de_games.png",
        category: AchievementCategory::Games,
        rarity: AchievementRarity::Rare,
        depends_on: &["primeiro_game"],
        position: (1, 1),
        rule: UnlockRule::ItemsAtLeast {
            media_type: Some(MediaType::Game),
            status: None,
            count: 10,
        },
    },
    AchievementNode {
        id: "primeiro_livro",
        title: "Primeiro Livro",
        description: "Adicione seu primeiro livro.",
        image: "/achievements/primeiro_livro.png",
        category: AchievementCategory::Books,
        rarity: AchievementRarity::Common,
        depends_on: &[],
        position: (2, 0),
        rule: UnlockRule::ItemsAtLeast {
            media_type: Some(MediaType::Book),
            status: None,
            count: 1,
        },
    },
    AchievementNode {
        id: "rato_de_biblioteca",
        title: "Rato de Biblioteca",
        description: "Complete 10 livros.",
        image: "/achievements/rato_de_biblioteca.png",
        category: AchievementCategory::Books,
        rarity: AchievementRarity::Epic,
        depends_on: &["primeiro_livro"],
        position: (2, 1),
        rule: UnlockRule::ItemsAtLeast {
            media_type: Some(MediaType::Book),
            status: Some(MediaStatus::Completed),
            count: 10,
        },
    },
    AchievementNode {
        id: "primeira_sessao",
        title: "Primeira Sessão",
        description: "Adicione seu primeiro filme.",
        image: "/achievements/primeira_sessao.png",
        category: AchievementCategory::Cinema,
        rarity: AchievementRarity::Common,
        depends_on: &[],
        position: (3, 0),
        rule: UnlockRule::ItemsAtLeast {
            media_type: Some(MediaType::Movie),
            status: None,
            count: 1,
        },
    },
    AchievementNode {
        id: "maratonista",
        title: "Maratonista",
        description: "Complete 5 séries.",
        image: "/achievements/maratonista.png",
        category: AchievementCategory::Cinema,
        rarity: AchievementRarity::Rare,
        depends_on: &[],
        position: (4, 0),
        rule: UnlockRule::ItemsAtLeast {
            media_type: Some(MediaType::Tv),
            status: Some(MediaStatus::Completed),
            count: 5,
        },
    },
    AchievementNode {
        id: "cinefilo_completo",
        title: "Cinéfilo Completo",
        description: "Complete 10 filmes, com sessões e maratonas no currículo.",
        image: "/achievements/cinefilo_completo.png",
        category: AchievementCategory::Cinema,
        rarity: AchievementRarity::Epic,
        depends_on: &["primeira_sessao", "maratonista"],
        position: (3, 1),
        rule: UnlockRule::ItemsAtLeast {
            media_type: Some(MediaType::Movie),
            status: Some(MediaStatus::Completed),
            count: 10,
        },
    },
    AchievementNode {
        id: "primeira_resenha",
        title: "Primeira Resenha",
        description: "Escreva sua primeira resenha.",
        image: "/achievements/primeira_resenha.png",
        category: AchievementCategory::Reviews,
        rarity: AchievementRarity::Common,
        depends_on: &[],
        position: (5, 0),
        rule: UnlockRule::ReviewsAtLeast { count: 1 },
    },
    AchievementNode {
        id: "critico_detalhista",
        title: "Crítico Detalhista",
        description: "Escreva uma resenha com pelo menos 100 caracteres.",
        image: "/achievements/critico_detalhista.png",
        category: AchievementCategory::Reviews,
        rarity: AchievementRarity::Rare,
        depends_on: &["primeira_resenha"],
        position: (5, 1),
        rule: UnlockRule::ReviewLengthAtLeast { chars: 100 },
    },
    AchievementNode {
        id: "resenhista_prolifico",
        title: "Resenhista Prolífico",
        description: "Escreva 10 resenhas.",
        image: "/achievements/resenhista_prolifico.png",
        category: AchievementCategory::Reviews,
        rarity: AchievementRarity::Epic,
        depends_on: &["primeira_resenha"],
        position: (6, 1),
        rule: UnlockRule::ReviewsAtLeast { count: 10 },
    },
    AchievementNode {
        id: "identidade_completa",
        title: "Identidade Completa",
        description: "Preencha nome, avatar e bio do seu perfil.",
        image: "/achievements/identidade_completa.png",
        category: AchievementCategory::Profile,
        rarity: AchievementRarity::Common,
        depends_on: &[],
        position: (7, 0),
        rule: UnlockRule::ProfileComplete,
    },
    AchievementNode {
        id: "mestre_multimidia",
        title: "Mestre Multimídia",
        description: "Complete obras de 3 tipos diferentes.",
        image: "/achievements/mestre_multimidia.png",
        category: AchievementCategory::Variety,
        rarity: AchievementRarity::Epic,
        depends_on: &[],
        position: (8, 0),
        rule: UnlockRule::CompletedTypeSpread { count: 3 },
    },
    AchievementNode {
        id: "onivoro_cultural",
        title: "Onívoro Cultural",
        description: "Complete obras de 5 tipos diferentes.",
        image: "/achievements/onivoro_cultural.png",
        category: AchievementCategory::Variety,
        rarity: AchievementRarity::Legendary,
        depends_on: &["mestre_multimidia"],
        position: (8, 1),
        rule: UnlockRule::CompletedTypeSpread { count: 5 },
    },
    AchievementNode {
        id: "nota_maxima",
        title: "Nota Máxima",
        description: "Dê nota 10 para alguma obra.",
        image: "/achievements/nota_maxima.png",
        category: AchievementCategory::Variety,
        rarity: AchievementRarity::Common,
        depends_on: &[],
        position: (9, 0),
        rule: UnlockRule::RatedAtLeast {
            rating: 10,
            count: 1,
        },
    },
    AchievementNode {
        id: "primeiro_favorito",
        title: "Primeiro Favorito",
        description: "Marque uma obra como favorita.",
        image: "/achievements/primeiro_favorito.png",
        category: AchievementCategory::Variety,
        rarity: AchievementRarity::Common,
        depends_on: &[],
        position: (10, 0),
        rule: UnlockRule::FavoritesAtLeast { count: 1 },
    },
    AchievementNode {
        id: "dedicacao_total",
        title: "Dedicação Total",
        description: "Acumule 500 horas registradas na estante.",
        image: "/achievements/dedicacao_total.png",
        category: AchievementCategory::Variety,
        rarity: AchievementRarity::Legendary,
        depends_on: &["viciado_em_horas"],
        position: (0, 3),
        rule: UnlockRule::TotalHoursAtLeast { hours: 500.0 },
    },
];

pub fn find_node(id: &str) -> Option<&'static AchievementNode> {
    CATALOG.iter().find(|node| node.id == id)
}
