use chrono::Utc;

use crate::api::links::LinkContext;
use crate::api::models::{CampInput, CampModel, SpeakerInput, SpeakerModel, TalkInput, TalkModel};
use crate::database::models::{Camp, Location, NewCamp, NewSpeaker, NewTalk, Speaker, Talk};
use crate::error::ApiError;

// Entity -> wire

pub fn camp_to_model(camp: &Camp, links: &LinkContext) -> CampModel {
    CampModel {
        url: links.camp(&camp.moniker),
        moniker: camp.moniker.clone(),
        name: camp.name.clone(),
        event_date: camp.event_date,
        length: camp.length,
        description: camp.description.clone(),
        location_address1: camp.location.address1.clone(),
        location_address2: camp.location.address2.clone(),
        location_address3: camp.location.address3.clone(),
        location_city_town: camp.location.city_town.clone(),
        location_state_province: camp.location.state_province.clone(),
        location_postal_code: camp.location.postal_code.clone(),
        location_country: camp.location.country.clone(),
        speakers: camp
            .speakers
            .as_ref()
            .map(|speakers| speakers_to_models(speakers, links)),
    }
}

pub fn speaker_to_model(speaker: &Speaker, links: &LinkContext) -> SpeakerModel {
    SpeakerModel {
        url: links.speaker(&speaker.camp_moniker, speaker.id),
        id: speaker.id,
        name: speaker.name.clone(),
        company_name: speaker.company_name.clone(),
        phone_number: speaker.phone_number.clone(),
        website_url: speaker.website_url.clone(),
        twitter_name: speaker.twitter_name.clone(),
        github_name: speaker.github_name.clone(),
        bio: speaker.bio.clone(),
        head_shot_url: speaker.head_shot_url.clone(),
        talks: speaker
            .talks
            .as_ref()
            .map(|talks| talks.iter().map(|t| talk_to_model(t, links)).collect()),
    }
}

pub fn speakers_to_models(speakers: &[Speaker], links: &LinkContext) -> Vec<SpeakerModel> {
    speakers.iter().map(|s| speaker_to_model(s, links)).collect()
}

pub fn talk_to_model(talk: &Talk, links: &LinkContext) -> TalkModel {
    TalkModel {
        url: links.talk(&talk.camp_moniker, talk.speaker_id, talk.id),
        id: talk.id,
        title: talk.title.clone(),
        abstract_text: talk.abstract_text.clone(),
        category: talk.category.clone(),
        level: talk.level,
        prerequisites: talk.prerequisites.clone(),
        starting_time: talk.starting_time,
        room: talk.room.clone(),
    }
}

// Wire -> entity. Inputs are validated before they get here.

fn missing(field: &str) -> ApiError {
    ApiError::field_error(field, format!("The {} field is required.", field))
}

pub fn new_camp(input: CampInput) -> Result<NewCamp, ApiError> {
    Ok(NewCamp {
        moniker: input.moniker.ok_or_else(|| missing("moniker"))?,
        name: input.name.ok_or_else(|| missing("name"))?,
        description: input.description.ok_or_else(|| missing("description"))?,
        event_date: input.event_date.unwrap_or_else(Utc::now),
        length: input.length.unwrap_or(1),
        location: Location {
            address1: input.location_address1.unwrap_or_default(),
            address2: input.location_address2.unwrap_or_default(),
            address3: input.location_address3.unwrap_or_default(),
            city_town: input.location_city_town.unwrap_or_default(),
            state_province: input.location_state_province.unwrap_or_default(),
            postal_code: input.location_postal_code.unwrap_or_default(),
            country: input.location_country.unwrap_or_default(),
        },
    })
}

pub fn new_speaker(input: SpeakerInput, camp_id: i32, owner: Option<String>) -> Result<NewSpeaker, ApiError> {
    Ok(NewSpeaker {
        camp_id,
        name: input.name.ok_or_else(|| missing("name"))?,
        company_name: input.company_name.unwrap_or_default(),
        phone_number: input.phone_number.unwrap_or_default(),
        website_url: input.website_url.unwrap_or_default(),
        twitter_name: input.twitter_name.unwrap_or_default(),
        github_name: input.github_name.unwrap_or_default(),
        bio: input.bio.unwrap_or_default(),
        head_shot_url: input.head_shot_url.unwrap_or_default(),
        owner,
    })
}

pub fn new_talk(input: TalkInput, speaker_id: i32) -> Result<NewTalk, ApiError> {
    Ok(NewTalk {
        speaker_id,
        title: input.title.ok_or_else(|| missing("title"))?,
        abstract_text: input.abstract_text.ok_or_else(|| missing("abstract"))?,
        category: input.category.unwrap_or_default(),
        level: input.level.ok_or_else(|| missing("level"))?,
        prerequisites: input.prerequisites.unwrap_or_default(),
        starting_time: input.starting_time.unwrap_or_else(Utc::now),
        room: input.room.unwrap_or_default(),
    })
}

// Partial merge: present fields overwrite, absent fields are left alone

fn merge<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}

/// The moniker is the camp's identity in URLs and cannot be changed here
pub fn apply_camp_input(camp: &mut Camp, input: CampInput) -> Result<(), ApiError> {
    if let Some(moniker) = &input.moniker {
        if *moniker != camp.moniker {
            return Err(ApiError::field_error("moniker", "The moniker of an existing camp cannot be changed."));
        }
    }

    merge(&mut camp.name, input.name);
    merge(&mut camp.description, input.description);
    merge(&mut camp.event_date, input.event_date);
    merge(&mut camp.length, input.length);
    let location = &mut camp.location;
    merge(&mut location.address1, input.location_address1);
    merge(&mut location.address2, input.location_address2);
    merge(&mut location.address3, input.location_address3);
    merge(&mut location.city_town, input.location_city_town);
    merge(&mut location.state_province, input.location_state_province);
    merge(&mut location.postal_code, input.location_postal_code);
    merge(&mut location.country, input.location_country);
    Ok(())
}

pub fn apply_speaker_input(speaker: &mut Speaker, input: SpeakerInput) {
    merge(&mut speaker.name, input.name);
    merge(&mut speaker.company_name, input.company_name);
    merge(&mut speaker.phone_number, input.phone_number);
    merge(&mut speaker.website_url, input.website_url);
    merge(&mut speaker.twitter_name, input.twitter_name);
    merge(&mut speaker.github_name, input.github_name);
    merge(&mut speaker.bio, input.bio);
    merge(&mut speaker.head_shot_url, input.head_shot_url);
}

pub fn apply_talk_input(talk: &mut Talk, input: TalkInput) {
    merge(&mut talk.title, input.title);
    merge(&mut talk.abstract_text, input.abstract_text);
    merge(&mut talk.category, input.category);
    merge(&mut talk.level, input.level);
    merge(&mut talk.prerequisites, input.prerequisites);
    merge(&mut talk.starting_time, input.starting_time);
    merge(&mut talk.room, input.room);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn camp() -> Camp {
        NewCamp {
            moniker: "ATL2016".into(),
            name: "Your First Code Camp".into(),
            description: "This is the first code camp".into(),
            event_date: Utc.with_ymd_and_hms(2016, 10, 18, 0, 0, 0).unwrap(),
            length: 2,
            location: Location {
                city_town: "Atlanta".into(),
                ..Location::default()
            },
        }
        .into_camp(1)
    }

    #[test]
    fn camp_model_flattens_location_and_links() {
        let model = camp_to_model(&camp(), &LinkContext::localhost());
        assert_eq!(model.url, "http://localhost/api/camps/ATL2016");
        assert_eq!(model.location_city_town, "Atlanta");
        assert!(model.speakers.is_none());
    }

    #[test]
    fn partial_merge_touches_only_present_fields() {
        let mut c = camp();
        apply_camp_input(
            &mut c,
            CampInput {
                name: Some("Renamed Code Camp".into()),
                location_country: Some(String::new()),
                ..CampInput::default()
            },
        )
        .unwrap();
        assert_eq!(c.name, "Renamed Code Camp");
        assert_eq!(c.description, "This is the first code camp");
        assert_eq!(c.length, 2);
        assert_eq!(c.location.city_town, "Atlanta");
        assert_eq!(c.location.country, "");
    }

    #[test]
    fn explicit_zero_is_applied() {
        let mut talk = new_talk(
            TalkInput {
                title: Some("Intro to axum".into()),
                abstract_text: Some("Routing and extractors in depth".into()),
                level: Some(200),
                ..TalkInput::default()
            },
            3,
        )
        .unwrap()
        .into_talk(9, "ATL2016".into());
        apply_talk_input(
            &mut talk,
            TalkInput {
                level: Some(0),
                ..TalkInput::default()
            },
        );
        assert_eq!(talk.level, 0);
    }

    #[test]
    fn moniker_cannot_change() {
        let mut c = camp();
        let err = apply_camp_input(
            &mut c,
            CampInput {
                moniker: Some("NYC2016".into()),
                ..CampInput::default()
            },
        )
        .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");

        // Restating the same moniker is fine
        apply_camp_input(
            &mut c,
            CampInput {
                moniker: Some("ATL2016".into()),
                ..CampInput::default()
            },
        )
        .unwrap();
    }

    #[test]
    fn new_camp_defaults_optional_fields() {
        let created = new_camp(CampInput {
            moniker: Some("ATL2017".into()),
            name: Some("Atlanta Code Camp".into()),
            description: Some("A full day of sessions for developers".into()),
            ..CampInput::default()
        })
        .unwrap();
        assert_eq!(created.length, 1);
        assert_eq!(created.location, Location::default());
    }

    #[test]
    fn talk_links_nest_under_speaker() {
        let talk = NewTalk {
            speaker_id: 4,
            title: "t".into(),
            abstract_text: "a".into(),
            category: String::new(),
            level: 100,
            prerequisites: String::new(),
            starting_time: Utc::now(),
            room: String::new(),
        }
        .into_talk(12, "ATL2016".into());
        let model = talk_to_model(&talk, &LinkContext::localhost());
        assert_eq!(model.url, "http://localhost/api/camps/ATL2016/speakers/4/talks/12");
    }
}
