use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "doctors")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub user_id: Uuid,
    pub full_name: String,
    pub specialization: String,
    pub license_number: String,
    pub license_path: String,
    pub status: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::checkup_applications::Entity")]
    CheckupApplications,
}

impl Related<super::checkup_applications::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CheckupApplications.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
