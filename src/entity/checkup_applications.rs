use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "checkup_applications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub doctor_id: Option<Uuid>,
    pub full_name: String,
    pub age: i32,
    pub gender: String,
    pub phone: String,
    pub email: Option<String>,
    pub concern: String,
    pub medical_history: Option<String>,
    pub current_medications: Option<String>,
    pub allergies: Option<String>,
    pub report_path: Option<String>,
    /// JSON array of storage keys.
    pub selfie_paths: Json,
    pub problem_description: String,
    pub problem_duration: Option<String>,
    pub status: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::doctors::Entity",
        from = "Column::DoctorId",
        to = "super::doctors::Column::Id"
    )]
    Doctors,
    #[sea_orm(has_many = "super::chat_messages::Entity")]
    ChatMessages,
    #[sea_orm(has_one = "super::kit_recommendations::Entity")]
    KitRecommendations,
}

impl Related<super::doctors::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Doctors.def()
    }
}

impl Related<super::chat_messages::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ChatMessages.def()
    }
}

impl Related<super::kit_recommendations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::KitRecommendations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
