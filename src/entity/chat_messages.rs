use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "chat_messages")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub application_id: Uuid,
    pub sender_id: Uuid,
    pub sender_role: String,
    #[sea_orm(column_type = "Text")]
    pub body: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::checkup_applications::Entity",
        from = "Column::ApplicationId",
        to = "super::checkup_applications::Column::Id"
    )]
    CheckupApplications,
}

impl Related<super::checkup_applications::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CheckupApplications.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
