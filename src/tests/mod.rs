//! Cross-module scenarios: a watch and its companion talking over the link,
//! and whole days of ticks.

mod face_tests;
