use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "students")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub teacher_id: i32,
    pub name: String,
    pub student_number: String, // natural key within a teacher's roster, used as scan token
    pub grade: String,
    pub email: Option<String>,
    pub reading_history: String, // JSON array of book ids, ordered, duplicates allowed
}

impl Model {
    /// Parse the reading history column. A malformed value is treated as empty
    /// rather than failing the whole read.
    pub fn history(&self) -> Vec<i32> {
        serde_json::from_str(&self.reading_history).unwrap_or_default()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// DTO for API responses
#[derive(Debug, Serialize, Deserialize)]
pub struct Student {
    pub id: i32,
    pub name: String,
    pub student_number: String,
    pub grade: String,
    pub email: Option<String>,
    pub reading_history: Vec<i32>,
    pub books_read: usize,
}

impl From<Model> for Student {
    fn from(model: Model) -> Self {
        let reading_history = model.history();
        Self {
            id: model.id,
            name: model.name,
            student_number: model.student_number,
            grade: model.grade,
            email: model.email,
            books_read: reading_history.len(),
            reading_history,
        }
    }
}
