// SPDX-License-Identifier: Apache-2.0

pub(crate) mod blocking;
pub(crate) mod extract;
pub(crate) mod handlers;
pub(crate) mod request_tracing;
pub(crate) mod response_contract;
