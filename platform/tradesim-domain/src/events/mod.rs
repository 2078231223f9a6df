pub mod desk_event;
