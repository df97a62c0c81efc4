pub mod collect_handlers;
