mod test_create_and_join;
mod test_leave_room;
mod test_room_capacity;
