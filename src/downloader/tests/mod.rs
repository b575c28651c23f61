use super::test_helpers::*;
use super::*;
use crate::types::{Event, MediaDescriptor, MediaId, ThreadContext, ThreadRef};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
