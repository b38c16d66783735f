//! Sport drill templates.

use serde::{Deserialize, Serialize};

use roster_model::SchemaField;

/// A named set of drills for one sport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SportTemplate {
    pub id: String,
    pub sport: String,
    pub name: String,
    pub drills: Vec<SchemaField>,
}

impl SportTemplate {
    pub fn new(id: &str, sport: &str, name: &str, drills: Vec<SchemaField>) -> Self {
        Self {
            id: id.to_string(),
            sport: sport.to_string(),
            name: name.to_string(),
            drills,
        }
    }

    pub fn drill(&self, key: &str) -> Option<&SchemaField> {
        self.drills.iter().find(|drill| drill.key == key)
    }

    pub fn drill_keys(&self) -> impl Iterator<Item = &str> {
        self.drills.iter().map(|drill| drill.key.as_str())
    }
}

fn timed(key: &str, label: &str, unit: &str) -> SchemaField {
    SchemaField::drill(key, label).with_unit(unit).lower_is_better()
}

fn measured(key: &str, label: &str, unit: &str) -> SchemaField {
    SchemaField::drill(key, label).with_unit(unit)
}

pub fn football() -> SportTemplate {
    SportTemplate::new(
        "football",
        "Football",
        "Football Combine",
        vec![
            timed("40m_dash", "40-Yard Dash", "sec").with_range(3.0, 15.0),
            measured("vertical_jump", "Vertical Jump", "in").with_range(0.0, 50.0),
            measured("catching", "Catching", "pts").with_range(0.0, 100.0),
            measured("throwing", "Throwing", "pts").with_range(0.0, 100.0),
            measured("agility", "Agility", "pts").with_range(0.0, 100.0),
        ],
    )
}

pub fn soccer() -> SportTemplate {
    SportTemplate::new(
        "soccer",
        "Soccer",
        "Soccer Combine",
        vec![
            timed("sprint_speed", "20m Sprint", "sec"),
            measured("ball_control", "Ball Control", "pts"),
            measured("passing_accuracy", "Passing Accuracy", "pts"),
            measured("shooting_power", "Shooting Power", "mph"),
            timed("agility_cones", "Agility (Cones)", "sec"),
            measured("endurance", "Endurance (Beep Test)", "level"),
        ],
    )
}

pub fn basketball() -> SportTemplate {
    SportTemplate::new(
        "basketball",
        "Basketball",
        "Basketball Combine",
        vec![
            timed("lane_agility", "Lane Agility", "sec").with_range(8.0, 20.0),
            measured("vertical_jump", "Vertical Jump", "in").with_range(0.0, 50.0),
            measured("free_throws", "Free Throw %", "%").with_range(0.0, 100.0),
            measured("three_point", "3-Point Shooting %", "%").with_range(0.0, 100.0),
            measured("dribbling", "Ball Handling", "pts").with_range(0.0, 100.0),
            timed("defensive_slide", "Defensive Slides", "sec").with_range(8.0, 20.0),
        ],
    )
}

pub fn baseball() -> SportTemplate {
    SportTemplate::new(
        "baseball",
        "Baseball",
        "Baseball Combine",
        vec![
            timed("sprint_60", "60-Yard Sprint", "sec"),
            measured("exit_velocity", "Exit Velocity", "mph"),
            measured("throwing_velocity", "Throwing Velocity", "mph"),
            measured("fielding_accuracy", "Fielding Accuracy", "pts"),
            timed("pop_time", "Pop Time (Catchers)", "sec"),
        ],
    )
}

pub fn track() -> SportTemplate {
    SportTemplate::new(
        "track",
        "Track & Field",
        "Track & Field",
        vec![
            timed("sprint_100", "100m Sprint", "sec"),
            timed("sprint_400", "400m Sprint", "sec"),
            measured("long_jump", "Long Jump", "ft"),
            measured("high_jump", "High Jump", "ft"),
            measured("shot_put", "Shot Put", "ft"),
            timed("mile_time", "Mile Run", "min"),
        ],
    )
}

pub fn volleyball() -> SportTemplate {
    SportTemplate::new(
        "volleyball",
        "Volleyball",
        "Volleyball Combine",
        vec![
            measured("vertical_jump", "Vertical Jump", "in"),
            measured("approach_jump", "Approach Jump", "in"),
            measured("serving_accuracy", "Serving Accuracy", "pts"),
            measured("passing_accuracy", "Passing Accuracy", "pts"),
            measured("attack_power", "Attack Power", "mph"),
            measured("blocking_reach", "Blocking Reach", "in"),
        ],
    )
}

/// All built-in templates, football first.
pub fn builtin_templates() -> Vec<SportTemplate> {
    vec![
        football(),
        soccer(),
        basketball(),
        baseball(),
        track(),
        volleyball(),
    ]
}
