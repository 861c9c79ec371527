// Copyright 2025 The Spoditor Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

/// Label set by the StatefulSet controller on every pod it owns
pub const LABEL_STATEFULSET_POD_NAME: &str = "statefulset.kubernetes.io/pod-name";

/// Annotation namespace
pub const ANNOTATION_PREFIX: &str = "spoditor.io/";
pub const ANNOTATION_SEPARATOR: char = '_';

/// Feature names consumed by the shipped handlers
pub const FEATURE_HOST_PORT: &str = "host-port";
pub const FEATURE_MOUNT_VOLUME: &str = "mount-volume";

/// Default handler registration order
pub const DEFAULT_HANDLERS: [&str; 2] = [FEATURE_MOUNT_VOLUME, FEATURE_HOST_PORT];

/// Injected environment variables
pub const ENV_POD_ORDINAL: &str = "POD_ORDINAL";
pub const ENV_PORT_PREFIX: &str = "PORT_";

/// Highest valid TCP/UDP port
pub const MAX_HOST_PORT: i32 = 65535;

/// Default config file location
pub const DEFAULT_CONF_FILE: &str = "/etc/spoditor/spoditor.toml";
pub const ENV_CONF_FILE: &str = "SPODITOR_CONF_FILE";
