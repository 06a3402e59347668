//! Repositories without default criteria.

use crate::model::setting::Setting;
use crate::model::user::User;
use crate::model::work::Work;
use crate::repo::repository::Repository;

pub type UserRepository<'conn> = Repository<'conn, User>;
pub type SettingRepository<'conn> = Repository<'conn, Setting>;
pub type WorkRepository<'conn> = Repository<'conn, Work>;
