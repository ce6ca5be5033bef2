//! Core domain types

pub mod amenity;
pub mod city;
pub mod place;
pub mod review;
pub mod state;
pub mod user;

pub use amenity::*;
pub use city::*;
pub use place::*;
pub use review::*;
pub use state::*;
pub use user::*;

use crate::{HbnbError, Result};
use chrono::{DateTime, SubsecRound, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Entity kinds known to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    State,
    City,
    Amenity,
    User,
    Place,
    Review,
}

impl Kind {
    pub const ALL: [Kind; 6] = [
        Kind::Amenity,
        Kind::City,
        Kind::Place,
        Kind::Review,
        Kind::State,
        Kind::User,
    ];

    /// Class name used in composite keys and the `__class__` field
    pub fn name(self) -> &'static str {
        match self {
            Kind::State => "State",
            Kind::City => "City",
            Kind::Amenity => "Amenity",
            Kind::User => "User",
            Kind::Place => "Place",
            Kind::Review => "Review",
        }
    }

    /// Collection name used by the HTTP API
    pub fn plural(self) -> &'static str {
        match self {
            Kind::State => "states",
            Kind::City => "cities",
            Kind::Amenity => "amenities",
            Kind::User => "users",
            Kind::Place => "places",
            Kind::Review => "reviews",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Build the `"<Class>.<id>"` index key
pub fn composite_key(kind: Kind, id: &str) -> String {
    format!("{}.{}", kind.name(), id)
}

/// Timestamp (de)serialization in microsecond ISO form without zone suffix
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    const WRITE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";
    const READ_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.format(WRITE_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp: {}", raw)))
    }

    /// Accepts the write format as well as RFC 3339.
    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        NaiveDateTime::parse_from_str(raw, READ_FORMAT)
            .map(|naive| naive.and_utc())
            .ok()
            .or_else(|| {
                DateTime::parse_from_rfc3339(raw)
                    .map(|dt| dt.with_timezone(&Utc))
                    .ok()
            })
    }
}

/// Current time at the precision timestamps are persisted with
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Attributes every entity carries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseFields {
    pub id: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl BaseFields {
    pub fn new() -> Self {
        let now = now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = now();
    }
}

impl Default for BaseFields {
    fn default() -> Self {
        Self::new()
    }
}

/// Any stored record, tagged with its class name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "__class__")]
pub enum Entity {
    State(State),
    City(City),
    Amenity(Amenity),
    User(User),
    Place(Place),
    Review(Review),
}

impl Entity {
    pub fn kind(&self) -> Kind {
        match self {
            Entity::State(_) => Kind::State,
            Entity::City(_) => Kind::City,
            Entity::Amenity(_) => Kind::Amenity,
            Entity::User(_) => Kind::User,
            Entity::Place(_) => Kind::Place,
            Entity::Review(_) => Kind::Review,
        }
    }

    pub fn base(&self) -> &BaseFields {
        match self {
            Entity::State(e) => &e.base,
            Entity::City(e) => &e.base,
            Entity::Amenity(e) => &e.base,
            Entity::User(e) => &e.base,
            Entity::Place(e) => &e.base,
            Entity::Review(e) => &e.base,
        }
    }

    pub fn id(&self) -> &str {
        &self.base().id
    }

    pub fn key(&self) -> String {
        composite_key(self.kind(), self.id())
    }

    /// The entity this one hangs off (City -> State, Place -> City, Review -> Place)
    pub fn parent(&self) -> Option<(Kind, &str)> {
        match self {
            Entity::City(city) => Some((Kind::State, city.state_id.as_str())),
            Entity::Place(place) => Some((Kind::City, place.city_id.as_str())),
            Entity::Review(review) => Some((Kind::Place, review.place_id.as_str())),
            Entity::State(_) | Entity::Amenity(_) | Entity::User(_) => None,
        }
    }

    /// Serialized form for API responses; secrets are stripped.
    pub fn to_public_json(&self) -> Result<Value> {
        let mut value = serde_json::to_value(self)?;
        if let Value::Object(map) = &mut value {
            map.remove("password");
        }
        Ok(value)
    }
}

/// Behaviour shared by the typed records
pub trait Model: Serialize + DeserializeOwned + Clone + Into<Entity> + Send + Sync + 'static {
    const KIND: Kind;

    /// Fields a create request must carry, checked in this order
    const REQUIRED: &'static [&'static str];

    /// Client-writable fields at creation
    const CREATE_FIELDS: &'static [&'static str];

    /// Client-writable fields on update
    const UPDATE_FIELDS: &'static [&'static str];

    fn base(&self) -> &BaseFields;

    fn base_mut(&mut self) -> &mut BaseFields;

    fn from_entity(entity: Entity) -> Option<Self>;

    /// Build a fresh record from client attributes plus server-assigned ones.
    fn build(attrs: &Map<String, Value>, assigned: &[(&str, &str)]) -> Result<Self> {
        let mut fields = into_object(serde_json::to_value(BaseFields::new())?)?;
        for (field, value) in assigned {
            fields.insert((*field).to_string(), Value::String((*value).to_string()));
        }
        let mut record: Self = serde_json::from_value(Value::Object(fields))?;
        merge_attributes(&mut record, attrs, Self::CREATE_FIELDS)?;
        Ok(record)
    }

    /// Apply an update request; fields outside `UPDATE_FIELDS` are ignored.
    fn update(&mut self, attrs: &Map<String, Value>) -> Result<()> {
        merge_attributes(self, attrs, Self::UPDATE_FIELDS)?;
        self.base_mut().touch();
        Ok(())
    }
}

/// Overlay the `allowed` fields of `attrs` onto `record`.
///
/// Values are never rejected for their type: each one is coerced to the
/// field's stored type with [`coerce`].
pub fn merge_attributes<T: Model>(
    record: &mut T,
    attrs: &Map<String, Value>,
    allowed: &[&str],
) -> Result<()> {
    let mut fields = into_object(serde_json::to_value(&*record)?)?;
    for field in allowed {
        if let (Some(value), Some(current)) = (attrs.get(*field), fields.get_mut(*field)) {
            *current = coerce(current, value);
        }
    }
    *record = serde_json::from_value(Value::Object(fields))?;
    Ok(())
}

/// Convert `value` to the JSON shape of `current`.
///
/// Text fields take strings as given and any other value as its JSON text
/// (`null` becomes empty). Numeric fields take numbers, numeric strings and
/// booleans; anything else falls back to zero. Integer fields truncate.
pub fn coerce(current: &Value, value: &Value) -> Value {
    match current {
        Value::String(_) => Value::String(match value {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }),
        Value::Number(n) if n.is_f64() => Value::from(as_f64(value).unwrap_or(0.0)),
        Value::Number(_) => Value::from(
            value
                .as_i64()
                .or_else(|| as_f64(value).map(|f| f.trunc() as i64))
                .unwrap_or(0),
        ),
        _ => value.clone(),
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
    .filter(|f| f.is_finite())
}

fn into_object(value: Value) -> Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(HbnbError::Serialization(format!(
            "expected an object, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_kind_names() {
        for kind in Kind::ALL {
            assert_eq!(Kind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(Kind::from_name("BaseModel"), None);
        assert_eq!(Kind::City.plural(), "cities");
        assert_eq!(composite_key(Kind::State, "abc"), "State.abc");
    }

    #[test]
    fn test_entity_serialization_has_class_tag() {
        let state = State::build(&attrs(json!({"name": "California"})), &[]).unwrap();
        let entity: Entity = state.clone().into();
        let value = serde_json::to_value(&entity).unwrap();

        assert_eq!(value["__class__"], "State");
        assert_eq!(value["name"], "California");
        assert_eq!(value["id"], state.base.id.as_str());

        let back: Entity = serde_json::from_value(value).unwrap();
        assert_eq!(back, entity);
    }

    #[test]
    fn test_timestamp_format() {
        let base = BaseFields::new();
        let value = serde_json::to_value(&base).unwrap();
        let created = value["created_at"].as_str().unwrap();

        // e.g. 2017-09-28T21:03:54.052298
        assert_eq!(created.len(), 26);
        assert!(!created.ends_with('Z'));
        assert_eq!(timestamp::parse(created), Some(base.created_at));
        assert!(timestamp::parse("2017-09-28T21:03:54Z").is_some());
        assert!(timestamp::parse("yesterday").is_none());
    }

    #[test]
    fn test_build_ignores_server_fields() {
        let city = City::build(
            &attrs(json!({"name": "Fremont", "id": "mine", "state_id": "other", "bogus": 1})),
            &[("state_id", "state-1")],
        )
        .unwrap();

        assert_eq!(city.name, "Fremont");
        assert_eq!(city.state_id, "state-1");
        assert_ne!(city.base.id, "mine");
    }

    #[test]
    fn test_update_filters_immutable_fields() {
        let mut user = User::build(
            &attrs(json!({"email": "a@b.c", "password": "pw", "first_name": "Ann"})),
            &[],
        )
        .unwrap();
        let id = user.base.id.clone();
        let created_at = user.base.created_at;

        user.update(&attrs(json!({
            "id": "new-id",
            "email": "x@y.z",
            "created_at": "2000-01-01T00:00:00.000000",
            "last_name": "Lee"
        })))
        .unwrap();

        assert_eq!(user.base.id, id);
        assert_eq!(user.email, "a@b.c");
        assert_eq!(user.base.created_at, created_at);
        assert_eq!(user.last_name, "Lee");
        assert_eq!(user.first_name, "Ann");
    }

    #[test]
    fn test_mistyped_values_are_coerced() {
        let mut place = Place::build(
            &attrs(json!({"user_id": "u", "name": 5, "max_guest": "4", "latitude": 37})),
            &[("city_id", "c")],
        )
        .unwrap();
        assert_eq!(place.name, "5");
        assert_eq!(place.max_guest, 4);
        assert_eq!(place.latitude, 37.0);

        place
            .update(&attrs(json!({
                "name": {"a": 1},
                "description": null,
                "number_rooms": "many",
                "number_bathrooms": 2.9,
                "price_by_night": true,
                "longitude": "-122.4"
            })))
            .unwrap();
        assert_eq!(place.name, r#"{"a":1}"#);
        assert_eq!(place.description, "");
        assert_eq!(place.number_rooms, 0);
        assert_eq!(place.number_bathrooms, 2);
        assert_eq!(place.price_by_night, 1);
        assert_eq!(place.longitude, -122.4);
    }

    #[test]
    fn test_coerce_keeps_fitting_values() {
        assert_eq!(coerce(&json!(""), &json!("Loft")), json!("Loft"));
        assert_eq!(coerce(&json!(0), &json!(3)), json!(3));
        assert_eq!(coerce(&json!(0.0), &json!(1.5)), json!(1.5));
        assert_eq!(coerce(&json!(0), &json!([1])), json!(0));
    }

    #[test]
    fn test_public_json_strips_password() {
        let user = User::build(&attrs(json!({"email": "a@b.c", "password": "pw"})), &[]).unwrap();
        let entity: Entity = user.into();

        let public = entity.to_public_json().unwrap();
        assert!(public.get("password").is_none());
        assert_eq!(public["email"], "a@b.c");
        assert_eq!(serde_json::to_value(&entity).unwrap()["password"], "pw");
    }

    #[test]
    fn test_parent() {
        let review = Review::build(
            &attrs(json!({"user_id": "u", "text": "great"})),
            &[("place_id", "p-1")],
        )
        .unwrap();
        let entity: Entity = review.into();
        assert_eq!(entity.parent(), Some((Kind::Place, "p-1")));

        let amenity: Entity = Amenity::build(&attrs(json!({"name": "Wifi"})), &[])
            .unwrap()
            .into();
        assert_eq!(amenity.parent(), None);
    }
}
