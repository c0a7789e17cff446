// SPDX-License-Identifier: Apache-2.0

pub(crate) mod analytics;
pub(crate) mod files;
pub(crate) mod group_tasks;
pub(crate) mod groups;
pub(crate) mod health;
pub(crate) mod notifications;
pub(crate) mod tasks;
pub(crate) mod users;
