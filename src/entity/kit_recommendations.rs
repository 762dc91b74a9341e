use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "kit_recommendations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub application_id: Uuid,
    pub doctor_id: Uuid,
    pub items: Json,
    pub notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
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
