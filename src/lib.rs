// src/lib.rs
//
// Expomos os módulos como biblioteca para que os testes de integração
// (tests/) consigam usar os serviços sem subir o binário.

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
