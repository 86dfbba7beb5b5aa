use chrono::{NaiveDateTime, Utc};
use diesel::{
    prelude::*,
    result::{DatabaseErrorKind, Error as DieselError},
};

use super::users;
use crate::{DbConn, Error};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub hashed_password: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub email: String,
    pub hashed_password: String,
    pub created_at: NaiveDateTime,
}

impl NewUser {
    pub fn new(email: impl Into<String>, hashed_password: String) -> Self {
        Self {
            email: email.into(),
            hashed_password,
            created_at: Utc::now().naive_utc(),
        }
    }
}

impl User {
    pub async fn find_by_email(conn: &DbConn, email: &str) -> Result<Option<User>, Error> {
        let email = email.to_owned();
        conn.interact(move |conn| {
            users::table
                .filter(users::email.eq(email))
                .select(User::as_select())
                .first(conn)
                .optional()
        })
        .await?
        .map_err(|e| e.into())
    }

    pub async fn insert(conn: &DbConn, user: NewUser) -> Result<User, Error> {
        let result = conn
            .interact(move |conn| {
                diesel::insert_into(users::table)
                    .values(user)
                    .returning(User::as_returning())
                    .get_result(conn)
            })
            .await?;

        match result {
            Ok(user) => Ok(user),
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                Err(Error::DuplicateUser)
            }
            Err(err) => Err(err.into()),
        }
    }
}
