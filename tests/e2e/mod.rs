// End-to-end tests for the piper stream server
//
// Each test gets its own server on an ephemeral port, backed by the
// in-process voice pool with tone-generating fake models installed in a
// temporary data dir. The pooled-process backend is exercised against a
// fake `piper` shell script.

mod helpers;
