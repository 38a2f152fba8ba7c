// Résumé editing: the form session, its validation rules and HTTP handlers.

pub mod controller;
pub mod handlers;
pub mod validation;
