pub mod verify_admin;
