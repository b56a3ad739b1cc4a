//! Hand-written entities shared by the unit tests.

use std::any::Any;

use chrono::NaiveDate;
use once_cell::sync::OnceCell;
use serde_json::json;
use uuid::Uuid;

use crate::schema::{Entity, FieldValue, Kind, Record, Schema, SchemaRef};
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Status {
    Active,
    Suspended,
    Banned,
}

impl FieldValue for Status {
    fn kind() -> Kind {
        Kind::Enum(&["Active", "Suspended", "Banned"])
    }

    fn value(&self) -> Value<'_> {
        Value::Enum(*self as u32)
    }
}

#[derive(Debug, Clone)]
pub struct Comment {
    pub text: String,
    pub score: i32,
}

#[derive(Debug, Clone)]
pub struct Post {
    pub title: String,
    pub likes: u32,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone)]
pub struct Address {
    pub city: String,
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub age: i32,
    pub email: Option<String>,
    pub status: Status,
    pub tags: Vec<String>,
    pub posts: Vec<Post>,
    pub comments: Vec<Comment>,
    pub address: Option<Address>,
    pub meta: serde_json::Value,
    pub joined: NaiveDate,
}

macro_rules! nested_record {
    ($ty:ty) => {
        impl FieldValue for $ty {
            fn kind() -> Kind {
                Kind::Record(SchemaRef::of::<$ty>())
            }

            fn value(&self) -> Value<'_> {
                Value::Record(self)
            }
        }
    };
}

nested_record!(Comment);
nested_record!(Post);
nested_record!(Address);
nested_record!(User);

impl Record for Comment {
    fn field(&self, name: &str) -> Value<'_> {
        match name {
            "text" => self.text.value(),
            "score" => self.score.value(),
            _ => Value::None,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Entity for Comment {
    fn schema() -> &'static Schema {
        static SCHEMA: OnceCell<Schema> = OnceCell::new();
        SCHEMA.get_or_init(|| {
            Schema::builder::<Comment>("Comment")
                .field::<String>("text")
                .field::<i32>("score")
                .build()
        })
    }
}

impl Record for Post {
    fn field(&self, name: &str) -> Value<'_> {
        match name {
            "title" => self.title.value(),
            "likes" => self.likes.value(),
            "comments" => self.comments.value(),
            _ => Value::None,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Entity for Post {
    fn schema() -> &'static Schema {
        static SCHEMA: OnceCell<Schema> = OnceCell::new();
        SCHEMA.get_or_init(|| {
            Schema::builder::<Post>("Post")
                .field::<String>("title")
                .field::<u32>("likes")
                .field::<Vec<Comment>>("comments")
                .build()
        })
    }
}

impl Record for Address {
    fn field(&self, name: &str) -> Value<'_> {
        match name {
            "city" => self.city.value(),
            _ => Value::None,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Entity for Address {
    fn schema() -> &'static Schema {
        static SCHEMA: OnceCell<Schema> = OnceCell::new();
        SCHEMA.get_or_init(|| Schema::builder::<Address>("Address").field::<String>("city").build())
    }
}

impl Record for User {
    fn field(&self, name: &str) -> Value<'_> {
        match name {
            "id" => self.id.value(),
            "name" => self.name.value(),
            "age" => self.age.value(),
            "email" => self.email.value(),
            "status" => self.status.value(),
            "tags" => self.tags.value(),
            "posts" => self.posts.value(),
            "comments" => self.comments.value(),
            "address" => self.address.value(),
            "meta" => self.meta.value(),
            "joined" => self.joined.value(),
            _ => Value::None,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Entity for User {
    fn schema() -> &'static Schema {
        static SCHEMA: OnceCell<Schema> = OnceCell::new();
        SCHEMA.get_or_init(|| {
            Schema::builder::<User>("User")
                .field::<Uuid>("id")
                .field::<String>("name")
                .field::<i32>("age")
                .field::<Option<String>>("email")
                .field::<Status>("status")
                .field::<Vec<String>>("tags")
                .field::<Vec<Post>>("posts")
                .field::<Vec<Comment>>("comments")
                .field::<Option<Address>>("address")
                .field::<serde_json::Value>("meta")
                .field::<NaiveDate>("joined")
                .build()
        })
    }
}

pub fn user_id(n: u128) -> Uuid {
    Uuid::from_u128(n)
}

fn comment(text: &str, score: i32) -> Comment {
    Comment {
        text: text.to_string(),
        score,
    }
}

fn post(title: &str, likes: u32, comments: Vec<Comment>) -> Post {
    Post {
        title: title.to_string(),
        likes,
        comments,
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid fixture date")
}

/// alice 25, bob 30, charlie 35, diana 22, eve 40.
pub fn users() -> Vec<User> {
    vec![
        User {
            id: user_id(1),
            name: "alice".to_string(),
            age: 25,
            email: Some("Alice@Example.com".to_string()),
            status: Status::Active,
            tags: vec!["rust".to_string(), "go".to_string()],
            posts: vec![post("Hello", 10, vec![comment("nice post", 2)])],
            comments: vec![comment("this is good stuff", 5)],
            address: Some(Address {
                city: "Paris".to_string(),
            }),
            meta: json!({"address": {"city": "Paris"}, "level": 3}),
            joined: date(2021, 3, 14),
        },
        User {
            id: user_id(2),
            name: "bob".to_string(),
            age: 30,
            email: None,
            status: Status::Suspended,
            tags: vec!["python".to_string()],
            posts: vec![post("Rust tips", 3, vec![])],
            comments: vec![comment("bad", 1)],
            address: Some(Address {
                city: "Berlin".to_string(),
            }),
            meta: json!({"address": {"city": "Berlin"}, "level": 5}),
            joined: date(2020, 1, 2),
        },
        User {
            id: user_id(3),
            name: "charlie".to_string(),
            age: 35,
            email: Some("charlie@example.org".to_string()),
            status: Status::Active,
            tags: vec![],
            posts: vec![post("Cooking", 7, vec![comment("yummy", 4)])],
            comments: vec![],
            address: None,
            meta: json!({"level": "gold"}),
            joined: date(2022, 7, 1),
        },
        User {
            id: user_id(4),
            name: "diana".to_string(),
            age: 22,
            email: Some("diana@example.com".to_string()),
            status: Status::Banned,
            tags: vec!["Rust".to_string()],
            posts: vec![],
            comments: vec![comment("meh", 0)],
            address: Some(Address {
                city: "paris".to_string(),
            }),
            meta: serde_json::Value::Null,
            joined: date(2023, 11, 30),
        },
        User {
            id: user_id(5),
            name: "eve".to_string(),
            age: 40,
            email: None,
            status: Status::Active,
            tags: vec!["go".to_string()],
            posts: vec![],
            comments: vec![],
            address: None,
            meta: json!({"address": {"city": "Rome"}}),
            joined: date(2019, 5, 20),
        },
    ]
}

pub fn names<'a>(users: impl IntoIterator<Item = &'a User>) -> Vec<&'a str> {
    users.into_iter().map(|u| u.name.as_str()).collect()
}
