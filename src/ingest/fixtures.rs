//! Test fixtures: representative JSON payloads from the IQAir
//! `nearest_city` endpoint, trimmed to the fields the parser reads plus a
//! few it ignores (`city`, `weather`) so the parser is exercised against
//! the real envelope.

/// Successful lookup near central Paris.
pub(crate) fn fixture_success_json() -> &'static str {
    r#"{
      "status": "success",
      "data": {
        "city": "Paris",
        "state": "Ile-de-France",
        "country": "France",
        "location": { "type": "Point", "coordinates": [2.351666, 48.859425] },
        "current": {
          "pollution": {
            "ts": "2025-08-07T17:00:00.000Z",
            "aqius": 62,
            "mainus": "p2",
            "aqicn": 21,
            "maincn": "p2"
          },
          "weather": {
            "ts": "2025-08-07T17:00:00.000Z",
            "tp": 27,
            "pr": 1017,
            "hu": 38,
            "ws": 3.6,
            "wd": 240,
            "ic": "01d"
          }
        }
      }
    }"#
}

/// Failure envelope returned with HTTP 200 for a bad key.
pub(crate) fn fixture_fail_json() -> &'static str {
    r#"{
      "status": "fail",
      "data": { "message": "API key invalid" }
    }"#
}
