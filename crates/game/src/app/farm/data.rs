use farmstead_engine::{Point, Rect, Size};
use serde::Deserialize;

use super::character::Direction;
use super::error::FarmError;

const FARM_DATA_JSON: &str = include_str!("../../../data/farm.json");

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct FarmData {
    pub(crate) spawn: Spawn,
    pub(crate) maps: Vec<MapLayout>,
    pub(crate) messages: Messages,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Spawn {
    pub(crate) map: String,
    pub(crate) at: Point,
    pub(crate) facing: Direction,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct MapLayout {
    pub(crate) key: String,
    pub(crate) size: Size,
    /// Bottom to top.
    pub(crate) layers: Vec<String>,
    #[serde(default)]
    pub(crate) fills: Vec<Fill>,
    #[serde(default)]
    pub(crate) invisible_blocks: Vec<Rect>,
    #[serde(default)]
    pub(crate) doors: Vec<Door>,
}

/// Paints `tile` over every cell of `rect`; later fills win.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Fill {
    pub(crate) layer: String,
    pub(crate) tile: String,
    pub(crate) rect: Rect,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Door {
    pub(crate) cell: Point,
    pub(crate) layer: String,
    /// Direction the character must face to open it.
    pub(crate) facing: Direction,
    pub(crate) leads_to: String,
    pub(crate) arrive_at: Point,
    pub(crate) arrive_facing: Direction,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Messages {
    pub(crate) welcome: String,
    pub(crate) good_night: String,
    /// `{day}` is replaced with the new day number.
    pub(crate) good_morning: String,
}

impl Messages {
    pub(crate) fn good_morning_for(&self, day: u32) -> String {
        self.good_morning.replace("{day}", &day.to_string())
    }
}

impl FarmData {
    pub(crate) fn builtin() -> Result<Self, FarmError> {
        Self::from_json_str(FARM_DATA_JSON)
    }

    pub(crate) fn from_json_str(raw: &str) -> Result<Self, FarmError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        let data: FarmData =
            serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
                let path = error.path().to_string();
                FarmError::Data {
                    path,
                    source: error.into_inner(),
                }
            })?;
        data.layout(&data.spawn.map)?;
        for layout in &data.maps {
            for door in &layout.doors {
                data.layout(&door.leads_to)?;
            }
        }
        Ok(data)
    }

    pub(crate) fn layout(&self, key: &str) -> Result<&MapLayout, FarmError> {
        self.maps
            .iter()
            .find(|layout| layout.key == key)
            .ok_or_else(|| FarmError::UnknownMap {
                map: key.to_string(),
            })
    }
}

impl MapLayout {
    pub(crate) fn door_at(&self, cell: Point, facing: Direction) -> Option<&Door> {
        self.doors
            .iter()
            .find(|door| door.cell == cell && door.facing == facing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_data_parses_and_links_maps() {
        let data = FarmData::builtin().expect("builtin farm data");
        assert_eq!(data.spawn.map, "home");
        let home = data.layout("home").expect("home");
        let door = home
            .door_at(Point::new(4, 7), Direction::Down)
            .expect("front door");
        assert_eq!(door.leads_to, "farm");
        assert!(home.door_at(Point::new(4, 7), Direction::Up).is_none());
        assert_eq!(data.messages.good_morning_for(3), "Day 3. Good morning!");
    }

    #[test]
    fn parse_errors_carry_the_field_path() {
        let raw = r#"{
            "spawn": { "map": "home", "at": { "x": 0, "y": 0 }, "facing": "sideways" },
            "maps": [],
            "messages": { "welcome": "", "good_night": "", "good_morning": "" }
        }"#;
        let error = FarmData::from_json_str(raw).expect_err("bad facing");
        match error {
            FarmError::Data { path, .. } => assert_eq!(path, "spawn.facing"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn doors_must_lead_to_known_maps() {
        let raw = r#"{
            "spawn": { "map": "shed", "at": { "x": 0, "y": 0 }, "facing": "up" },
            "maps": [{
                "key": "shed",
                "size": { "width": 2, "height": 2 },
                "layers": ["floor"],
                "doors": [{
                    "cell": { "x": 0, "y": 1 },
                    "layer": "floor",
                    "facing": "down",
                    "leads_to": "nowhere",
                    "arrive_at": { "x": 0, "y": 0 },
                    "arrive_facing": "down"
                }]
            }],
            "messages": { "welcome": "", "good_night": "", "good_morning": "" }
        }"#;
        let error = FarmData::from_json_str(raw).expect_err("dangling door");
        assert!(matches!(error, FarmError::UnknownMap { map } if map == "nowhere"));
    }
}
