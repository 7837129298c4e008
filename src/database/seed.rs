use chrono::{TimeZone, Utc};
use tracing::info;

use crate::auth::PasswordHasher;
use crate::database::models::{Location, NewCamp, NewSpeaker, NewTalk, NewUser, SUPER_USER_CLAIM};
use crate::database::repository::CampRepository;

pub const SEED_CAMP_MONIKER: &str = "ATL2016";
pub const SEED_USERNAME: &str = "shawnwildermuth";

/// Populate an empty store with one camp, its speakers and talks, and a
/// super-user account. Does nothing when the seed camp is already present.
pub async fn seed(
    repo: &dyn CampRepository,
    passwords: &PasswordHasher,
    password: &str,
) -> anyhow::Result<()> {
    if repo.get_camp_by_moniker(SEED_CAMP_MONIKER).await?.is_some() {
        info!("Seed data already present, skipping");
        return Ok(());
    }

    if repo.get_user(SEED_USERNAME).await?.is_none() {
        let password_hash = passwords.hash(password).await?;
        repo.add_user(NewUser {
            username: SEED_USERNAME.to_string(),
            password_hash,
            first_name: "Shawn".to_string(),
            last_name: "Wildermuth".to_string(),
            claims: vec![SUPER_USER_CLAIM.to_string()],
        })
        .await?;
    }

    let camp = repo
        .add_camp(NewCamp {
            moniker: SEED_CAMP_MONIKER.to_string(),
            name: "Your First Code Camp".to_string(),
            description: "This is the first code camp".to_string(),
            event_date: Utc.with_ymd_and_hms(2016, 10, 18, 0, 0, 0).single().unwrap_or_else(Utc::now),
            length: 1,
            location: Location {
                address1: "123 Main Street".to_string(),
                city_town: "Atlanta".to_string(),
                state_province: "GA".to_string(),
                postal_code: "30303".to_string(),
                country: "USA".to_string(),
                ..Location::default()
            },
        })
        .await?;

    let speakers = [
        ("Shawn Wildermuth", "Wilder Minds LLC", "shawnwildermuth", "Shawn is a Microsoft MVP, author and trainer."),
        ("Resa Wildermuth", "Wilder Minds LLC", "resawildermuth", "Resa is a designer and front-end developer."),
    ];

    for (name, company, handle, bio) in speakers {
        let speaker = repo
            .add_speaker(NewSpeaker {
                camp_id: camp.id,
                name: name.to_string(),
                company_name: company.to_string(),
                phone_number: "555-1212".to_string(),
                website_url: format!("https://{}.com", handle),
                twitter_name: handle.to_string(),
                github_name: handle.to_string(),
                bio: bio.to_string(),
                head_shot_url: format!("https://{}.com/headshot.jpg", handle),
                owner: None,
            })
            .await?;

        for (title, level, hour) in [("How to do ASP.NET Core", 100, 13), ("How to do Bootstrap 4", 200, 15)] {
            repo.add_talk(NewTalk {
                speaker_id: speaker.id,
                title: title.to_string(),
                abstract_text: format!("{} ({}) walks through the basics end to end", title, name),
                category: "Web Development".to_string(),
                level,
                prerequisites: "None".to_string(),
                starting_time: Utc
                    .with_ymd_and_hms(2016, 10, 18, hour, 0, 0)
                    .single()
                    .unwrap_or_else(Utc::now),
                room: "Room 1".to_string(),
            })
            .await?;
        }
    }

    info!("Seeded camp {} with {} speakers", SEED_CAMP_MONIKER, speakers.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::InMemoryCampRepository;

    #[tokio::test]
    async fn seeding_twice_is_a_no_op() {
        let repo = InMemoryCampRepository::new();
        let passwords = PasswordHasher::new(4);

        seed(&repo, &passwords, "P@ssw0rd!").await.unwrap();
        seed(&repo, &passwords, "P@ssw0rd!").await.unwrap();

        assert_eq!(repo.get_all_camps().await.unwrap().len(), 1);
        let speakers = repo.get_speakers_by_moniker_with_talks(SEED_CAMP_MONIKER).await.unwrap();
        assert_eq!(speakers.len(), 2);
        assert!(speakers.iter().all(|s| s.talks.as_ref().map(Vec::len) == Some(2)));

        let user = repo.get_user(SEED_USERNAME).await.unwrap().unwrap();
        assert!(user.claims.iter().any(|c| c == SUPER_USER_CLAIM));
    }
}
