use chrono::Utc;

use crate::db::Db;
use crate::models::{User, new_id};

pub(crate) async fn seed_user(db: &Db, email: &str) -> User {
    let now = Utc::now();
    let user = User {
        id: new_id(),
        name: email.split('@').next().unwrap_or(email).to_owned(),
        email: email.to_owned(),
        email_verified: true,
        image: None,
        created_at: now,
        updated_at: now,
    };
    db.insert_user(&user).await.unwrap();
    user
}
