//! Reservation entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reservations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub guest_id: String,

    #[sea_orm(nullable)]
    pub staff_id: Option<String>,

    pub room_code: String,

    /// InPerson, Online
    pub kind: String,

    /// Pending, Confirmed, Cancelled, CheckedIn, Finalized
    pub status: String,

    pub checkin: DateTimeUtc,
    pub checkout: DateTimeUtc,

    #[sea_orm(nullable)]
    pub actual_checkin: Option<DateTimeUtc>,

    #[sea_orm(nullable)]
    pub actual_checkout: Option<DateTimeUtc>,

    pub nightly_price: String,
    pub discount: String,
    pub taxes: String,
    pub guest_count: i32,

    #[sea_orm(nullable)]
    pub notes: Option<String>,

    #[sea_orm(nullable)]
    pub cancellation_reason: Option<String>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::room::Entity",
        from = "Column::RoomCode",
        to = "super::room::Column::Code"
    )]
    Room,
    #[sea_orm(
        belongs_to = "super::guest::Entity",
        from = "Column::GuestId",
        to = "super::guest::Column::Id"
    )]
    Guest,
    #[sea_orm(has_one = "super::receivable::Entity")]
    Receivable,
}

impl Related<super::room::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Room.def()
    }
}

impl Related<super::guest::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Guest.def()
    }
}

impl Related<super::receivable::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Receivable.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
