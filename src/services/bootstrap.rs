//! One-shot startup tasks: the admin reconciliation and the optional demo
//! data for an empty database.

use chrono::Utc;

use crate::database::{Repositories, UserRepository};
use crate::errors::Result;
use crate::models::news::News;
use crate::models::player::Player;
use crate::models::user::User;

/// Leaves `username` as the only admin account, creating it with `password`
/// when it does not exist. An existing account keeps its password.
pub async fn ensure_single_admin(
    users: &dyn UserRepository,
    username: &str,
    password: &str,
    bcrypt_cost: u32,
) -> Result<User> {
    let demoted = users.demote_admins_except(username).await?;
    if demoted > 0 {
        tracing::warn!("Demoted {} account(s) that were marked as admin", demoted);
    }

    match users.find_by_username(username).await? {
        Some(mut admin) => {
            if !admin.is_admin {
                admin.is_admin = true;
                users.update(&admin).await?;
                tracing::info!(username = %username, "Promoted existing account to admin");
            } else {
                tracing::info!(username = %username, "Admin account ensured as the only admin");
            }
            Ok(admin)
        }
        None => {
            let hash = bcrypt::hash(password, bcrypt_cost)?;
            let mut admin = User::new(username, hash);
            admin.is_admin = true;
            let admin = users.insert(admin).await?;
            tracing::info!(username = %username, "Default admin account created");
            Ok(admin)
        }
    }
}

struct DemoPlayer {
    name: &'static str,
    number: i64,
    position: &'static str,
    height: &'static str,
    goals: i64,
    matches: i64,
    description: &'static str,
}

const DEMO_PLAYERS: [DemoPlayer; 6] = [
    DemoPlayer {
        name: "Giacinto Lesce",
        number: 7,
        position: "Centrocampista",
        height: "178 cm",
        goals: 5,
        matches: 8,
        description: "Giocatore tecnico con grande visione di gioco.",
    },
    DemoPlayer {
        name: "Francesco Russo",
        number: 9,
        position: "Attaccante",
        height: "182 cm",
        goals: 4,
        matches: 10,
        description: "Leader con ottime capacità di finalizzazione.",
    },
    DemoPlayer {
        name: "Giuseppe Papasso",
        number: 22,
        position: "Attaccante",
        height: "175 cm",
        goals: 6,
        matches: 9,
        description: "Puro goleador, sempre pericoloso in area.",
    },
    DemoPlayer {
        name: "Luca Argentano",
        number: 14,
        position: "Attaccante",
        height: "180 cm",
        goals: 8,
        matches: 7,
        description: "Veloce e scattante, pericoloso in contropiede.",
    },
    DemoPlayer {
        name: "Gabriele Guerrieri",
        number: 8,
        position: "Centrocampista",
        height: "177 cm",
        goals: 2,
        matches: 8,
        description: "Centrocampista di sostegno.",
    },
    DemoPlayer {
        name: "Antonio Graniti",
        number: 31,
        position: "Difensore",
        height: "185 cm",
        goals: 0,
        matches: 5,
        description: "Difensore centrale solido.",
    },
];

const DEMO_NEWS: [(&str, &str); 2] = [
    (
        "Benvenuti in Zaccaro's World Cup",
        "La stagione è iniziata! Segui classifica marcatori, giocatori e aggiornamenti qui.",
    ),
    (
        "Primo turno disputato",
        "Tutte le squadre sono scese in campo. Resta aggiornato su risultati e protagonisti.",
    ),
];

/// Fills an empty roster and an empty news feed independently.
pub async fn seed_demo_data(repos: &Repositories) -> Result<()> {
    if repos.players.count().await? == 0 {
        for demo in &DEMO_PLAYERS {
            repos
                .players
                .insert(Player {
                    id: 0,
                    name: demo.name.to_string(),
                    number: demo.number,
                    position: demo.position.to_string(),
                    height: demo.height.to_string(),
                    goals: demo.goals,
                    matches: demo.matches,
                    description: demo.description.to_string(),
                    image: String::new(),
                    created_at: Utc::now(),
                })
                .await?;
        }
        tracing::info!("Seeded {} demo players", DEMO_PLAYERS.len());
    }

    if repos.news.count().await? == 0 {
        for (title, content) in DEMO_NEWS {
            repos
                .news
                .insert(News {
                    id: 0,
                    title: title.to_string(),
                    content: content.to_string(),
                    image: String::new(),
                    created_at: Utc::now(),
                })
                .await?;
        }
        tracing::info!("Seeded {} demo news items", DEMO_NEWS.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const COST: u32 = 4;

    async fn register(repos: &Repositories, username: &str, is_admin: bool) -> User {
        let mut user = User::new(username, bcrypt::hash("secret", COST).unwrap());
        user.is_admin = is_admin;
        repos.users.insert(user).await.unwrap()
    }

    async fn admins(repos: &Repositories) -> Vec<String> {
        repos
            .users
            .list()
            .await
            .unwrap()
            .into_iter()
            .filter(|u| u.is_admin)
            .map(|u| u.username)
            .collect()
    }

    #[tokio::test]
    async fn creates_the_admin_when_missing() {
        let repos = Repositories::memory();
        let admin = ensure_single_admin(repos.users.as_ref(), "admin", "admin", COST)
            .await
            .unwrap();
        assert!(admin.is_admin);
        assert!(bcrypt::verify("admin", &admin.password_hash).unwrap());
        assert_eq!(admins(&repos).await, vec!["admin"]);
    }

    #[tokio::test]
    async fn demotes_everyone_else_and_keeps_existing_password() {
        let repos = Repositories::memory();
        register(&repos, "alice", true).await;
        register(&repos, "bob", true).await;
        register(&repos, "admin", false).await;

        let admin = ensure_single_admin(repos.users.as_ref(), "admin", "other", COST)
            .await
            .unwrap();

        assert!(bcrypt::verify("secret", &admin.password_hash).unwrap());
        assert_eq!(admins(&repos).await, vec!["admin"]);
    }

    #[tokio::test]
    async fn running_twice_changes_nothing() {
        let repos = Repositories::memory();
        register(&repos, "alice", true).await;
        ensure_single_admin(repos.users.as_ref(), "admin", "admin", COST).await.unwrap();
        ensure_single_admin(repos.users.as_ref(), "admin", "admin", COST).await.unwrap();

        assert_eq!(repos.users.list().await.unwrap().len(), 2);
        assert_eq!(admins(&repos).await, vec!["admin"]);
    }

    #[tokio::test]
    async fn demo_data_only_fills_empty_collections() {
        let repos = Repositories::memory();
        seed_demo_data(&repos).await.unwrap();
        seed_demo_data(&repos).await.unwrap();

        let players = repos.players.list().await.unwrap();
        assert_eq!(players.len(), 6);
        assert_eq!(players[0].name, "Luca Argentano");
        assert_eq!(repos.news.count().await.unwrap(), 2);
    }
}
